//! Organizer Scenario Tests
//!
//! End-to-end flows against the in-process backend and in-memory SQLite.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::api::testing::FakeApi;
    use crate::commands::{ChatRole, CommandError, NewItem, Organizer};
    use crate::config::AppConfig;
    use crate::domain::{is_temp_id, DomainError, Item, ItemType, OperationType, Workspace};
    use crate::hierarchy::{DragState, DropPosition};
    use crate::repository::{init_db, DbConn};
    use crate::store::{NoticeLevel, StoreEvent};
    use crate::sync::SyncOutcome;

    fn config() -> AppConfig {
        AppConfig { save_debounce_ms: 500, ..AppConfig::default() }
    }

    /// Main: Projects[A, B, C], Folder F[G], Loose note. Side: empty.
    fn seeded_api() -> Arc<FakeApi> {
        Arc::new(FakeApi::with_data(
            vec![Workspace::new("w1", "Main"), Workspace::new("w2", "Side")],
            vec![
                Item::new("p", "w1", ItemType::Folder, "Projects"),
                Item::new("a", "w1", ItemType::Note, "A").under(Some("p"), 0),
                Item::new("b", "w1", ItemType::Note, "B").under(Some("p"), 1),
                Item::new("c", "w1", ItemType::Note, "C").under(Some("p"), 2),
                Item::new("f", "w1", ItemType::Folder, "Folder F").under(None, 1),
                Item::new("g", "w1", ItemType::Folder, "G").under(Some("f"), 0),
                Item::new("n", "w1", ItemType::Note, "Loose note").under(None, 2),
            ],
        ))
    }

    async fn organizer_on(api: Arc<FakeApi>, conn: DbConn) -> Organizer {
        let organizer = Organizer::new(api, conn, "user-1", &config());
        organizer.load().await.expect("load failed");
        organizer
    }

    async fn organizer(api: Arc<FakeApi>) -> Organizer {
        organizer_on(api, init_db(Path::new(":memory:")).unwrap()).await
    }

    fn position(organizer: &Organizer, id: &str) -> (Option<String>, i64) {
        let item = organizer.store().item(id).unwrap();
        (item.parent_id, item.order_index)
    }

    fn error_notices(rx: &mut tokio::sync::broadcast::Receiver<StoreEvent>) -> usize {
        std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, StoreEvent::Notification(n) if n.level == NoticeLevel::Error))
            .count()
    }

    // ========================
    // Loading
    // ========================

    #[tokio::test]
    async fn test_load_fills_store() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        assert_eq!(api.sync_calls(), 1);
        assert_eq!(organizer.workspaces().len(), 2);
        assert_eq!(organizer.store().current_workspace_id().as_deref(), Some("w1"));
        let tree = organizer.current_tree();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0].children.len(), 3);
    }

    #[tokio::test]
    async fn test_overlapping_resync_is_ignored() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        api.set_delay(Duration::from_millis(50));

        let (first, second) = tokio::join!(organizer.resync(), organizer.resync());
        let ran = [first.unwrap(), second.unwrap()];
        assert_eq!(ran.iter().filter(|r| **r).count(), 1);
        assert_eq!(api.sync_calls(), 2);
    }

    #[tokio::test]
    async fn test_selection_survives_restart() {
        let api = seeded_api();
        let conn = init_db(Path::new(":memory:")).unwrap();
        let organizer = organizer_on(api.clone(), conn.clone()).await;
        organizer.select_workspace("w2").await.unwrap();
        assert!(matches!(
            organizer.select_workspace("nope").await,
            Err(CommandError::Domain(DomainError::NotFound(_)))
        ));

        let restarted = organizer_on(api, conn).await;
        assert_eq!(restarted.store().current_workspace_id().as_deref(), Some("w2"));
    }

    #[tokio::test]
    async fn test_create_workspace_selects_it() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        let workspace = organizer.create_workspace("  Reading ").await.unwrap();

        assert_eq!(workspace.name, "Reading");
        assert_eq!(organizer.store().current_workspace_id(), Some(workspace.id));
        assert!(organizer.create_workspace(" ").await.is_err());
    }

    // ========================
    // Moves
    // ========================

    #[tokio::test]
    async fn test_reorder_within_parent() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        assert!(organizer.move_item("a", "c", DropPosition::After).await.unwrap());

        assert_eq!(position(&organizer, "b"), (Some("p".into()), 0));
        assert_eq!(position(&organizer, "c"), (Some("p".into()), 1));
        assert_eq!(position(&organizer, "a"), (Some("p".into()), 2));

        let mut sent: Vec<(String, i64)> = api.order_calls().into_iter().map(|u| (u.id, u.order_index)).collect();
        sent.sort();
        assert_eq!(sent, vec![("a".into(), 2), ("b".into(), 0), ("c".into(), 1)]);
    }

    #[tokio::test]
    async fn test_move_into_folder() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        assert!(organizer.move_item("n", "f", DropPosition::Inside).await.unwrap());

        assert_eq!(position(&organizer, "n"), (Some("f".into()), 1));
        assert_eq!(position(&organizer, "f"), (None, 1));
        assert_eq!(position(&organizer, "g"), (Some("f".into()), 0));
    }

    #[tokio::test]
    async fn test_drag_gesture_moves_item() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        let mut drag = DragState::new();
        drag.press("n".to_string(), 10, 100);
        assert!(drag.motion(10, 40));
        // Middle of the folder row
        drag.hover("f".to_string(), 12.0, 24.0, true);
        let intent = drag.release().unwrap();

        assert!(organizer.drop_item(intent).await.unwrap());
        assert_eq!(position(&organizer, "n"), (Some("f".into()), 1));
    }

    #[tokio::test]
    async fn test_cycle_is_rejected_silently() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        let before = organizer.store().items();
        let mut rx = organizer.store().subscribe();

        assert!(!organizer.move_item("f", "g", DropPosition::Inside).await.unwrap());
        assert!(!organizer.move_item("a", "b", DropPosition::Inside).await.unwrap());
        assert!(!organizer.move_item("a", "a", DropPosition::After).await.unwrap());

        assert_eq!(organizer.store().items(), before);
        assert!(api.order_calls().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_drop_in_place_is_noop() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        assert!(!organizer.move_item("a", "b", DropPosition::Before).await.unwrap());
        assert!(api.order_calls().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_notifies_once_and_resyncs() {
        let api = seeded_api();
        api.fail_order_update("b");
        let organizer = organizer(api.clone()).await;
        let mut rx = organizer.store().subscribe();

        assert!(organizer.move_item("a", "c", DropPosition::After).await.unwrap());

        assert_eq!(api.order_calls().len(), 3);
        assert_eq!(error_notices(&mut rx), 1);
        assert_eq!(api.sync_calls(), 2);
        // Server truth after the reload: the two successful updates stuck
        assert_eq!(position(&organizer, "a").1, 2);
        assert_eq!(position(&organizer, "c").1, 1);
        assert_eq!(position(&organizer, "b").1, 1);
    }

    // ========================
    // Create / edit
    // ========================

    #[tokio::test]
    async fn test_create_swaps_temp_id() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        let created = organizer
            .create_item(NewItem::new(ItemType::Note, "Hello").under("p"))
            .await
            .unwrap();

        assert_eq!(created.id, "srv-1");
        assert_eq!(created.order_index, 3);
        assert!(organizer.store().items().iter().all(|i| !i.is_temporary()));
        assert_eq!(api.created()[0].0, "w1");
    }

    fn temp_item_titled(organizer: &Organizer, title: &str) -> Item {
        organizer
            .store()
            .items()
            .into_iter()
            .find(|i| i.is_temporary() && i.title == title)
            .unwrap()
    }

    #[tokio::test]
    async fn test_delete_during_create_stays_deleted() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        api.set_delay(Duration::from_millis(100));

        let (created, deleted) = tokio::join!(
            organizer.create_item(NewItem::new(ItemType::Note, "Doomed")),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let temp = temp_item_titled(&organizer, "Doomed");
                organizer.delete_permanently(&temp.id).await
            }
        );
        let created = created.unwrap();
        assert_eq!(deleted.unwrap(), 1);

        assert!(organizer.store().item(&created.id).is_none());
        assert_eq!(api.deleted(), vec![created.id.clone()]);

        organizer.resync().await.unwrap();
        assert!(organizer.store().items().iter().all(|i| i.title != "Doomed"));
    }

    #[tokio::test]
    async fn test_rename_during_create_is_kept_and_sent() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        api.set_delay(Duration::from_millis(100));

        let (created, renamed) = tokio::join!(
            organizer.create_item(NewItem::new(ItemType::Note, "Draft")),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let temp = temp_item_titled(&organizer, "Draft");
                organizer.rename_item(&temp.id, "Renamed").await
            }
        );
        let created = created.unwrap();
        renamed.unwrap();

        assert_eq!(created.title, "Renamed");
        assert_eq!(organizer.store().item(&created.id).unwrap().title, "Renamed");
        assert_eq!(organizer.pending_count().await.unwrap(), 0);

        organizer.resync().await.unwrap();
        assert_eq!(organizer.store().item(&created.id).unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_failed_create_is_removed() {
        let api = seeded_api();
        api.fail_creates();
        let organizer = organizer(api.clone()).await;
        let count = organizer.store().items().len();
        let mut rx = organizer.store().subscribe();

        let result = organizer.create_item(NewItem::new(ItemType::Video, "Clip")).await;

        assert!(matches!(result, Err(CommandError::Api(_))));
        assert_eq!(organizer.store().items().len(), count);
        assert_eq!(error_notices(&mut rx), 1);
    }

    #[tokio::test]
    async fn test_create_validates_parent() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        let into_note = organizer.create_item(NewItem::new(ItemType::Note, "x").under("a")).await;
        assert!(matches!(into_note, Err(CommandError::Domain(DomainError::InvalidInput(_)))));
        let missing = organizer.create_item(NewItem::new(ItemType::Note, "x").under("zzz")).await;
        assert!(matches!(missing, Err(CommandError::Domain(DomainError::NotFound(_)))));
        assert!(api.created().is_empty());
    }

    #[tokio::test]
    async fn test_rename_online_and_offline() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        organizer.rename_item("a", "Alpha").await.unwrap();
        assert_eq!(api.update_calls()[0].1.title.as_deref(), Some("Alpha"));

        organizer.set_online(false).await.unwrap();
        organizer.rename_item("b", "Beta").await.unwrap();
        assert_eq!(api.update_calls().len(), 1);
        assert_eq!(organizer.pending_count().await.unwrap(), 1);
        assert_eq!(organizer.store().item("b").unwrap().title, "Beta");
    }

    #[tokio::test(start_paused = true)]
    async fn test_content_saves_are_debounced() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        for text in ["<p>d</p>", "<p>dr</p>", "<p>draft</p>"] {
            organizer.update_content("a", text.to_string()).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(organizer.store().item("a").unwrap().content.as_deref(), Some("<p>draft</p>"));
        assert!(api.update_calls().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        let calls = api.update_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.content.as_deref(), Some("<p>draft</p>"));
        // Nothing left scheduled once the save went out
        assert_eq!(organizer.saves.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_task_checklist() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        let task = organizer.create_item(NewItem::new(ItemType::Task, "Chores")).await.unwrap();

        organizer.add_task_entry(&task.id, "dishes").await.unwrap();
        organizer.add_task_entry(&task.id, "laundry").await.unwrap();
        let list = organizer.toggle_task_entry(&task.id, 1).await.unwrap();
        assert_eq!(list.progress(), (1, 2));

        assert!(organizer.toggle_task_entry(&task.id, 9).await.is_err());
        assert!(organizer.add_task_entry("a", "nope").await.is_err());
    }

    // ========================
    // Trash / delete
    // ========================

    #[tokio::test]
    async fn test_trash_and_restore_subtree() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        organizer.trash_item("p").await.unwrap();
        assert_eq!(organizer.trash().len(), 4);
        assert!(organizer.current_tree().iter().all(|n| n.id() != "p"));
        assert!(api.update_calls().iter().all(|(_, c)| c.active == Some(false)));
        assert_eq!(api.update_calls().len(), 4);

        organizer.restore_item("p").await.unwrap();
        assert!(organizer.trash().is_empty());
        assert_eq!(api.restored().len(), 4);
        assert_eq!(organizer.current_tree()[0].children.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_permanently_children_first() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        assert_eq!(organizer.delete_permanently("f").await.unwrap(), 2);
        assert_eq!(api.deleted(), vec!["g".to_string(), "f".to_string()]);
        assert!(organizer.store().item("g").is_none());
    }

    #[tokio::test]
    async fn test_deleting_unsynced_item_drops_its_queue_entries() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        organizer.set_online(false).await.unwrap();

        let draft = organizer.create_item(NewItem::new(ItemType::Note, "Draft")).await.unwrap();
        organizer.rename_item(&draft.id, "Draft 2").await.unwrap();
        assert_eq!(organizer.pending_count().await.unwrap(), 2);

        organizer.delete_permanently(&draft.id).await.unwrap();
        assert_eq!(organizer.pending_count().await.unwrap(), 0);
        assert!(api.deleted().is_empty());
    }

    // ========================
    // Offline replay
    // ========================

    #[tokio::test]
    async fn test_offline_work_replays_on_reconnect() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        api.set_next_id(41);
        organizer.set_online(false).await.unwrap();

        let draft = organizer
            .create_item(NewItem::new(ItemType::Note, "Offline").under("p"))
            .await
            .unwrap();
        assert!(is_temp_id(&draft.id));
        assert!(organizer.move_item(&draft.id, "a", DropPosition::Before).await.unwrap());
        assert!(api.order_calls().is_empty());

        let queued = organizer.pending_operations().await.unwrap();
        assert_eq!(queued[0].op_type(), OperationType::Create);
        assert!(queued[1..].iter().all(|op| op.op_type() == OperationType::UpdateOrder));

        organizer.set_online(true).await.unwrap();

        assert_eq!(api.batches().len(), 1);
        assert_eq!(organizer.pending_count().await.unwrap(), 0);
        assert!(organizer.store().item(&draft.id).is_none());
        assert_eq!(position(&organizer, "srv-42"), (Some("p".into()), 0));
        assert_eq!(position(&organizer, "a"), (Some("p".into()), 1));
    }

    #[tokio::test]
    async fn test_failed_replay_keeps_queue() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        organizer.set_online(false).await.unwrap();
        organizer.rename_item("a", "Alpha").await.unwrap();

        api.fail_batches_with(502);
        assert!(organizer.set_online(true).await.is_err());
        assert_eq!(organizer.pending_count().await.unwrap(), 1);
        assert!(organizer.is_online());
    }

    #[tokio::test]
    async fn test_flush_with_nothing_queued() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        assert_eq!(organizer.flush_pending().await.unwrap(), SyncOutcome::Empty);
    }

    // ========================
    // AI chat, search, progress
    // ========================

    #[tokio::test]
    async fn test_ai_excerpt_becomes_note() {
        let api = seeded_api();
        api.set_ai_reply("Ownership means one owner.\nBorrowing is temporary.");
        let organizer = organizer(api.clone()).await;

        let reply = organizer.ask_ai("explain rust").await.unwrap();
        assert!(reply.starts_with("Ownership"));
        let transcript = organizer.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(api.ai_requests()[0].user_id, "user-1");
        assert_eq!(api.ai_requests()[0].workspace_id, "w1");

        let note = organizer.save_excerpt_as_note(1, 0..26, Some("p")).await.unwrap();
        assert_eq!(note.title, "Ownership means one owner.");
        assert_eq!(note.content.as_deref(), Some("<p>Ownership means one owner.</p>"));
        assert_eq!(note.parent_id.as_deref(), Some("p"));

        assert!(organizer.save_excerpt_as_note(7, 0..3, None).await.is_err());
        assert!(organizer.save_excerpt_as_note(1, 5..5, None).await.is_err());
    }

    #[tokio::test]
    async fn test_ai_failure_is_reported() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        api.set_offline(true);
        let mut rx = organizer.store().subscribe();

        assert!(organizer.ask_ai("anything").await.is_err());
        assert_eq!(error_notices(&mut rx), 1);
        assert_eq!(organizer.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_search_and_rows() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;

        let hits = organizer.search("loose", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item.id, "n");

        assert_eq!(organizer.tree_rows().len(), 7);
        assert!(organizer.toggle_collapsed("p"));
        assert_eq!(organizer.tree_rows().len(), 4);
    }

    #[tokio::test]
    async fn test_workspace_progress() {
        let api = seeded_api();
        let organizer = organizer(api.clone()).await;
        let progress = organizer.workspace_progress("w1").await.unwrap();
        assert_eq!(progress.total_items, 7);
        assert_eq!(progress.percent(), 0);
    }
}
