//! Behavioural tests for the board subsystem.
//!
//! Each scenario is written once against the store traits and run for
//! every store implementation.

mod common;

use uuid::Uuid;

use common::{create_board, create_user};
use gotcha::board::{BoardService, PrivilegeType, Relation};
use gotcha::storage::{BoardStore, UserStore};
use gotcha::GotchaError;

trait Store: UserStore + BoardStore {}
impl<T: UserStore + BoardStore> Store for T {}

async fn new_root_board_has_one_author_relation<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let service = BoardService::new(store);

    let longest = "t".repeat(255);
    for title in ["Diary", "x", "日記", longest.as_str()] {
        let board = service.new_root_board(&alice, title).await.unwrap();
        assert_eq!(board.relations.len(), 1);

        let perm = service.privilege_of(board.relations[0]).await.unwrap();
        assert_eq!(perm.privilege, PrivilegeType::Author);
        assert_eq!(perm.user_id, alice.id);
        assert_eq!(perm.board_id, board.id());
    }
}

async fn invalid_titles_are_rejected<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "Diary").await.unwrap();

    let too_long = "t".repeat(256);
    for title in ["", "   ", too_long.as_str()] {
        assert!(matches!(
            service.new_root_board(&alice, title).await,
            Err(GotchaError::Validation(_))
        ));
        assert!(matches!(
            service.new_nested_board(root.id(), title, &alice).await,
            Err(GotchaError::Validation(_))
        ));
    }
    assert_eq!(service.root_boards_of_user(&alice).await.unwrap().len(), 1);
}

async fn author_deletes_root_board<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let service = BoardService::new(store);
    let keep = service.new_root_board(&alice, "Keep").await.unwrap();
    let board = service.new_root_board(&alice, "Drop").await.unwrap();
    let nested = service
        .new_nested_board(board.id(), "Sub", &alice)
        .await
        .unwrap();

    service
        .delete_root_board(board.id(), &board.relations, &alice)
        .await
        .unwrap();

    let boards = service.root_boards_of_user(&alice).await.unwrap();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].id(), keep.id());

    assert!(store.relation(board.relations[0]).await.unwrap().is_none());
    assert!(store.board(nested.id()).await.unwrap().is_none());
    assert!(matches!(
        service.resolve_root(nested.id()).await,
        Err(GotchaError::NotFound(_))
    ));
}

async fn read_write_grantee_cannot_delete_root<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let service = BoardService::new(store);
    let board = service.new_root_board(&alice, "Diary").await.unwrap();
    let rel = service
        .grant_relation(board.id(), &alice, bob.id, "editor", PrivilegeType::ReadWrite)
        .await
        .unwrap();

    let result = service.delete_root_board(board.id(), &[rel.id], &bob).await;
    assert!(matches!(result, Err(GotchaError::Security)));
    assert!(service.board_info(board.id()).await.is_ok());
}

async fn forged_relations_cannot_delete_root<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let service = BoardService::new(store);
    let target = service.new_root_board(&alice, "Target").await.unwrap();
    let other = service.new_root_board(&alice, "Other").await.unwrap();
    let bobs = service.new_root_board(&bob, "Bob's").await.unwrap();

    // Author relation, but on another board
    let result = service
        .delete_root_board(target.id(), &other.relations, &alice)
        .await;
    assert!(matches!(result, Err(GotchaError::Security)));

    // Valid relation mixed with a foreign one
    let claimed = [target.relations[0], bobs.relations[0]];
    let result = service.delete_root_board(target.id(), &claimed, &alice).await;
    assert!(matches!(result, Err(GotchaError::Security)));

    // Someone else's author relation on the right board
    let result = service
        .delete_root_board(target.id(), &target.relations, &bob)
        .await;
    assert!(matches!(result, Err(GotchaError::Security)));

    // Relation that does not exist
    let result = service
        .delete_root_board(target.id(), &[Uuid::new_v4()], &alice)
        .await;
    assert!(matches!(result, Err(GotchaError::Security)));

    assert!(service.board_info(target.id()).await.is_ok());
}

async fn nested_chain_resolves_to_root<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();
    let a = service.new_nested_board(root.id(), "A", &alice).await.unwrap();
    let b = service.new_nested_board(a.id(), "B", &alice).await.unwrap();
    let c = service.new_nested_board(b.id(), "C", &alice).await.unwrap();

    assert_eq!(b.parent_id, a.id());
    assert_eq!(c.parent_id, b.id());

    for node in [root.id(), a.id(), b.id(), c.id()] {
        let resolved = service.resolve_root(node).await.unwrap();
        assert_eq!(resolved.id(), root.id());
        assert_eq!(resolved.relations, root.relations);
    }

    assert!(matches!(
        service.resolve_root(Uuid::new_v4()).await,
        Err(GotchaError::NotFound(_))
    ));
}

async fn read_only_can_list_but_not_mutate<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();
    let child = service.new_nested_board(root.id(), "child", &alice).await.unwrap();
    service
        .grant_relation(root.id(), &alice, bob.id, "reader", PrivilegeType::ReadOnly)
        .await
        .unwrap();

    let listed = service.nested_boards_of(root.id(), &bob).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), child.id());

    // Visibility applies at every depth
    assert!(service.nested_boards_of(child.id(), &bob).await.unwrap().is_empty());

    assert!(matches!(
        service.new_nested_board(root.id(), "nope", &bob).await,
        Err(GotchaError::Security)
    ));
    assert!(matches!(
        service.new_nested_board(child.id(), "nope", &bob).await,
        Err(GotchaError::Security)
    ));
    assert!(matches!(
        service.delete_nested_board(child.id(), &bob).await,
        Err(GotchaError::Security)
    ));
    assert!(store.board(child.id()).await.unwrap().is_some());
}

async fn outsider_cannot_see_nested_boards<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let mallory = create_user(store, "mallory").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();
    let child = service.new_nested_board(root.id(), "child", &alice).await.unwrap();

    assert!(matches!(
        service.nested_boards_of(root.id(), &mallory).await,
        Err(GotchaError::Security)
    ));
    assert!(matches!(
        service.nested_boards_of(child.id(), &mallory).await,
        Err(GotchaError::Security)
    ));
    assert!(matches!(
        service
            .grant_relation(root.id(), &mallory, mallory.id, "", PrivilegeType::ReadWrite)
            .await,
        Err(GotchaError::Security)
    ));
}

async fn diary_scenario<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let service = BoardService::new(store);

    let diary = service.new_root_board(&alice, "Diary").await.unwrap();
    assert_eq!(diary.relations.len(), 1);
    assert_eq!(
        service.privilege_of(diary.relations[0]).await.unwrap().privilege,
        PrivilegeType::Author
    );

    let read_only = service
        .grant_relation(diary.id(), &alice, bob.id, "read", PrivilegeType::ReadOnly)
        .await
        .unwrap();
    assert!(service.nested_boards_of(diary.id(), &bob).await.unwrap().is_empty());
    assert!(matches!(
        service.new_nested_board(diary.id(), "Sub", &bob).await,
        Err(GotchaError::Security)
    ));

    // Upgrade Bob
    service
        .grant_relation(diary.id(), &alice, bob.id, "write", PrivilegeType::ReadWrite)
        .await
        .unwrap();
    service.revoke_relation(read_only.id, &alice).await.unwrap();

    let sub = service.new_nested_board(diary.id(), "Sub", &bob).await.unwrap();
    let seen_by_alice = service.nested_boards_of(diary.id(), &alice).await.unwrap();
    assert_eq!(seen_by_alice.len(), 1);
    assert_eq!(seen_by_alice[0].id(), sub.id());
    assert_eq!(seen_by_alice[0].base.title, "Sub");
    assert_eq!(seen_by_alice[0].relation_id, sub.relation_id);

    let bobs_boards = service.root_boards_of_user(&bob).await.unwrap();
    assert_eq!(bobs_boards.len(), 1);
    assert_eq!(bobs_boards[0].id(), diary.id());
    assert_eq!(bobs_boards[0].relations.len(), 1);
}

async fn nested_listing_is_one_level<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();
    let a = service.new_nested_board(root.id(), "A", &alice).await.unwrap();
    let b = service.new_nested_board(root.id(), "B", &alice).await.unwrap();
    let deep = service.new_nested_board(a.id(), "deep", &alice).await.unwrap();

    let mut top: Vec<Uuid> = service
        .nested_boards_of(root.id(), &alice)
        .await
        .unwrap()
        .iter()
        .map(|n| n.id())
        .collect();
    top.sort();
    let mut expected = vec![a.id(), b.id()];
    expected.sort();
    assert_eq!(top, expected);

    let under_a = service.nested_boards_of(a.id(), &alice).await.unwrap();
    assert_eq!(under_a.len(), 1);
    assert_eq!(under_a[0].id(), deep.id());
    assert_eq!(under_a[0].parent_id, a.id());
}

async fn delete_nested_board_removes_subtree<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();
    let a = service.new_nested_board(root.id(), "A", &alice).await.unwrap();
    let b = service.new_nested_board(a.id(), "B", &alice).await.unwrap();
    let sibling = service.new_nested_board(root.id(), "S", &alice).await.unwrap();
    service
        .grant_relation(root.id(), &alice, bob.id, "", PrivilegeType::ReadWrite)
        .await
        .unwrap();

    service.delete_nested_board(a.id(), &bob).await.unwrap();

    assert!(store.board(a.id()).await.unwrap().is_none());
    assert!(store.board(b.id()).await.unwrap().is_none());
    assert!(store.parent_link(b.id()).await.unwrap().is_none());
    let remaining = service.nested_boards_of(root.id(), &alice).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), sibling.id());

    assert!(matches!(
        service.delete_nested_board(a.id(), &alice).await,
        Err(GotchaError::NotFound(_))
    ));
    // Roots are only deleted through delete_root_board
    assert!(matches!(
        service.delete_nested_board(root.id(), &alice).await,
        Err(GotchaError::NotFound(_))
    ));
}

async fn grants_attach_to_the_root<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();
    let child = service.new_nested_board(root.id(), "child", &alice).await.unwrap();

    let rel = service
        .grant_relation(child.id(), &alice, bob.id, "via child", PrivilegeType::ReadOnly)
        .await
        .unwrap();
    assert_eq!(rel.board_id, root.id());
    assert_eq!(rel.description, "via child");
    assert_eq!(service.board_info(root.id()).await.unwrap().relations.len(), 2);

    assert!(matches!(
        service
            .grant_relation(root.id(), &alice, Uuid::new_v4(), "", PrivilegeType::ReadOnly)
            .await,
        Err(GotchaError::NotFound(_))
    ));
    assert!(matches!(
        service
            .grant_relation(root.id(), &alice, bob.id, &"d".repeat(256), PrivilegeType::ReadOnly)
            .await,
        Err(GotchaError::Validation(_))
    ));
    assert!(matches!(
        service
            .grant_relation(root.id(), &alice, bob.id, "", PrivilegeType::Author)
            .await,
        Err(GotchaError::Validation(_))
    ));
}

async fn relations_only_attach_to_roots<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();
    let child = service.new_nested_board(root.id(), "child", &alice).await.unwrap();

    // Bypass the service: the store itself must refuse a nested target
    let rel = Relation::new(child.id(), bob.id, "", PrivilegeType::ReadWrite);
    assert!(matches!(
        store.insert_relation(&rel).await,
        Err(GotchaError::NotFound(_))
    ));
    assert!(store.relation(rel.id).await.unwrap().is_none());
    assert!(store.relations_of_board(child.id()).await.unwrap().is_empty());
    assert!(store.relations_of_user(bob.id).await.unwrap().is_empty());

    let rel = Relation::new(root.id(), bob.id, "", PrivilegeType::ReadWrite);
    store.insert_relation(&rel).await.unwrap();
    assert_eq!(store.relation(rel.id).await.unwrap(), Some(rel));
}

async fn only_author_grants_and_revokes<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let carol = create_user(store, "carol_1").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();
    let bobs = service
        .grant_relation(root.id(), &alice, bob.id, "", PrivilegeType::ReadWrite)
        .await
        .unwrap();

    assert!(matches!(
        service
            .grant_relation(root.id(), &bob, carol.id, "", PrivilegeType::ReadOnly)
            .await,
        Err(GotchaError::Security)
    ));
    assert!(matches!(
        service.revoke_relation(bobs.id, &bob).await,
        Err(GotchaError::Security)
    ));

    service.revoke_relation(bobs.id, &alice).await.unwrap();
    assert!(matches!(
        service.privilege_of(bobs.id).await,
        Err(GotchaError::NotFound(_))
    ));
    assert!(matches!(
        service.nested_boards_of(root.id(), &bob).await,
        Err(GotchaError::Security)
    ));
    assert!(matches!(
        service.revoke_relation(bobs.id, &alice).await,
        Err(GotchaError::NotFound(_))
    ));
}

async fn duplicate_grants_are_independent<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    let service = BoardService::new(store);
    let root = service.new_root_board(&alice, "root").await.unwrap();

    let first = service
        .grant_relation(root.id(), &alice, bob.id, "one", PrivilegeType::ReadWrite)
        .await
        .unwrap();
    let second = service
        .grant_relation(root.id(), &alice, bob.id, "two", PrivilegeType::ReadWrite)
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let bobs_boards = service.root_boards_of_user(&bob).await.unwrap();
    assert_eq!(bobs_boards.len(), 1);
    assert_eq!(bobs_boards[0].relations.len(), 2);

    service.revoke_relation(first.id, &alice).await.unwrap();
    assert!(service.new_nested_board(root.id(), "still", &bob).await.is_ok());
}

async fn users_are_unique<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let verifier = common::verifier();

    let same_name = gotcha::RegistrationRequest::new("alice_1", "new@example.com", "password123");
    let same_email =
        gotcha::RegistrationRequest::new("alice_2", "alice_1@example.com", "password123");
    assert!(matches!(
        gotcha::register(store, &verifier, &same_name).await,
        Err(GotchaError::EntityDuplicate(_))
    ));
    assert!(matches!(
        gotcha::register(store, &verifier, &same_email).await,
        Err(GotchaError::EntityDuplicate(_))
    ));

    let bob = create_user(store, "bob_123").await;
    let others = store.list_users_except(alice.id).await.unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].id, bob.id);
    assert_eq!(store.count_users().await.unwrap(), 2);
}

async fn boards_of_user_follow_creation<S: Store>(store: &S) {
    let alice = create_user(store, "alice_1").await;
    let bob = create_user(store, "bob_123").await;
    assert!(BoardService::new(store)
        .root_boards_of_user(&alice)
        .await
        .unwrap()
        .is_empty());

    let a = create_board(store, &alice, "A").await;
    create_board(store, &bob, "Bob's").await;

    let boards = BoardService::new(store).root_boards_of_user(&alice).await.unwrap();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0], a);
}

macro_rules! board_contract_tests {
    (@cases $setup:expr; $($case:ident),* $(,)?) => {
        $(
            #[tokio::test]
            async fn $case() {
                let store = $setup;
                super::$case(&store).await;
            }
        )*
    };
    ($backend:ident, $setup:expr) => {
        mod $backend {
            board_contract_tests!(@cases $setup;
                new_root_board_has_one_author_relation,
                invalid_titles_are_rejected,
                author_deletes_root_board,
                read_write_grantee_cannot_delete_root,
                forged_relations_cannot_delete_root,
                nested_chain_resolves_to_root,
                read_only_can_list_but_not_mutate,
                outsider_cannot_see_nested_boards,
                diary_scenario,
                nested_listing_is_one_level,
                delete_nested_board_removes_subtree,
                grants_attach_to_the_root,
                relations_only_attach_to_roots,
                only_author_grants_and_revokes,
                duplicate_grants_are_independent,
                users_are_unique,
                boards_of_user_follow_creation,
            );
        }
    };
}

board_contract_tests!(memory, gotcha::MemoryStorage::new());

#[cfg(feature = "sqlite")]
board_contract_tests!(sqlite, gotcha::Database::open_in_memory().await.unwrap());
