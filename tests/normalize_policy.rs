use proptest::prelude::*;

use mutlog::{
    normalize::{
        normalize_delete, normalize_edit, normalize_event, AttachmentSnapshot, AuthorSnapshot,
        GatewayEvent, InvalidEventError, MessageSnapshot,
    },
    record::{AttachmentRef, Mutation},
    types::MutationKind,
};

fn author(is_bot: bool) -> AuthorSnapshot {
    AuthorSnapshot {
        id: Some(7),
        name: "ana".to_string(),
        avatar_url: Some("https://cdn.example/ana.png".to_string()),
        is_bot,
    }
}

fn attachment(name: &str) -> AttachmentSnapshot {
    AttachmentSnapshot {
        url: format!("https://cdn.example/{name}"),
        filename: name.to_string(),
        content_type: None,
    }
}

fn msg(content: &str, attachments: Vec<AttachmentSnapshot>, is_bot: bool) -> MessageSnapshot {
    MessageSnapshot {
        id: Some(1001),
        author: Some(author(is_bot)),
        channel_id: Some(55),
        content: content.to_string(),
        attachments,
    }
}

#[test]
fn delete_produces_record_without_after_text() {
    let draft = normalize_delete(&msg("hello", vec![], false))
        .expect("valid")
        .expect("kept");
    assert_eq!(draft.mutation, Mutation::Delete);
    assert_eq!(draft.content_before, "hello");
    assert_eq!(draft.message_id, 1001);
    assert_eq!(draft.channel_id, 55);
    assert_eq!(draft.author.id, 7);
    assert_eq!(draft.author.avatar_url.as_deref(), Some("https://cdn.example/ana.png"));
}

#[test]
fn delete_of_bot_message_is_filtered() {
    assert_eq!(normalize_delete(&msg("hello", vec![], true)), Ok(None));
}

#[test]
fn empty_delete_without_attachments_is_filtered() {
    assert_eq!(normalize_delete(&msg("", vec![], false)), Ok(None));
}

#[test]
fn attachment_only_delete_is_kept_with_empty_text() {
    let draft = normalize_delete(&msg("", vec![attachment("cat.png")], false))
        .expect("valid")
        .expect("kept");
    assert_eq!(draft.content_before, "");
    assert_eq!(
        draft.attachments,
        vec![AttachmentRef {
            url: "https://cdn.example/cat.png".to_string(),
            filename: "cat.png".to_string(),
            content_type: None,
        }]
    );
}

#[test]
fn edit_keeps_before_attachments() {
    let before = msg("foo", vec![attachment("a.png"), attachment("b.png")], false);
    let after = msg("bar", vec![], false);
    let draft = normalize_edit(&before, &after).expect("valid").expect("kept");
    assert_eq!(draft.mutation.kind(), MutationKind::Edit);
    assert_eq!(draft.content_before, "foo");
    assert_eq!(draft.mutation.content_after(), Some("bar"));
    let names: Vec<_> = draft.attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, ["a.png", "b.png"]);
}

#[test]
fn unchanged_edit_is_filtered_even_when_attachments_differ() {
    let before = msg("same", vec![], false);
    let after = msg("same", vec![attachment("preview.png")], false);
    assert_eq!(normalize_edit(&before, &after), Ok(None));
}

#[test]
fn edit_by_bot_is_filtered() {
    assert_eq!(
        normalize_edit(&msg("foo", vec![], true), &msg("bar", vec![], true)),
        Ok(None)
    );
}

#[test]
fn edit_from_empty_text_is_kept() {
    let draft = normalize_edit(&msg("", vec![], false), &msg("now with text", vec![], false))
        .expect("valid")
        .expect("kept");
    assert_eq!(draft.content_before, "");
}

#[test]
fn missing_identity_fields_are_rejected() {
    let mut no_author = msg("x", vec![], false);
    no_author.author = None;
    assert_eq!(normalize_delete(&no_author), Err(InvalidEventError::MissingAuthor));

    let mut no_author_id = msg("x", vec![], false);
    if let Some(a) = no_author_id.author.as_mut() {
        a.id = None;
    }
    assert_eq!(normalize_delete(&no_author_id), Err(InvalidEventError::MissingAuthor));

    let mut no_id = msg("x", vec![], false);
    no_id.id = None;
    assert_eq!(normalize_delete(&no_id), Err(InvalidEventError::MissingMessageId));

    let mut no_channel = msg("x", vec![], false);
    no_channel.channel_id = None;
    assert_eq!(
        normalize_edit(&no_channel, &msg("y", vec![], false)),
        Err(InvalidEventError::MissingChannel)
    );
}

#[test]
fn filtered_bot_event_is_not_rejected_for_missing_ids() {
    let mut partial = msg("x", vec![], true);
    partial.id = None;
    partial.channel_id = None;
    assert_eq!(normalize_delete(&partial), Ok(None));
}

#[test]
fn event_dispatch_matches_direct_calls() {
    let before = msg("foo", vec![], false);
    let after = msg("bar", vec![], false);
    assert_eq!(
        normalize_event(&GatewayEvent::Edited {
            before: before.clone(),
            after: after.clone()
        }),
        normalize_edit(&before, &after)
    );
    assert_eq!(
        normalize_event(&GatewayEvent::Deleted(before.clone())),
        normalize_delete(&before)
    );
}

proptest! {
    #[test]
    fn bot_events_never_produce_drafts(content in ".{0,16}", other in ".{0,16}", n_att in 0usize..3) {
        let atts: Vec<_> = (0..n_att).map(|i| attachment(&format!("{i}.png"))).collect();
        let before = msg(&content, atts, true);
        prop_assert_eq!(normalize_delete(&before), Ok(None));
        prop_assert_eq!(normalize_edit(&before, &msg(&other, vec![], true)), Ok(None));
    }

    #[test]
    fn edits_produce_draft_iff_text_changed(before in "[a-c]{0,3}", after in "[a-c]{0,3}", n_att in 0usize..3) {
        let atts: Vec<_> = (0..n_att).map(|i| attachment(&format!("{i}.png"))).collect();
        let out = normalize_edit(&msg(&before, atts, false), &msg(&after, vec![], false))
            .expect("valid");
        if before == after {
            prop_assert!(out.is_none());
        } else {
            let draft = out.expect("kept");
            prop_assert_eq!(draft.attachments.len(), n_att);
            prop_assert_eq!(draft.mutation.content_after(), Some(after.as_str()));
        }
    }
}
