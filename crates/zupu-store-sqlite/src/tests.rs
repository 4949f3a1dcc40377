//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;
use zupu_core::{
  account::{Role, SignIn, SignUp},
  audit::{AuditAction, AuditQuery, NewAuditEntry},
  event::{EventPatch, NewEvent},
  individual::{IndividualPatch, NewIndividual, Sex},
  relationship::{NewRelationship, RelationshipKind},
  store::{
    AuditSink, DirectoryStore, IdentityStore, IndividualOrder, IndividualQuery,
    RelationshipQuery,
  },
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn person(name: &str, sex: Sex, year: i32) -> NewIndividual {
  NewIndividual::new(name, sex, date(year, 1, 1), "北京")
}

// ─── Individuals ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_individual() {
  let s = store().await;
  let mut input = person("张三", Sex::Male, 1950);
  input.residence = Some("上海".into());

  let created = s.create_individual(input).await.unwrap();
  assert!(created.id > 0);

  let fetched = s.get_individual(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.residence.as_deref(), Some("上海"));
}

#[tokio::test]
async fn get_individual_missing_returns_none() {
  let s = store().await;
  assert!(s.get_individual(42).await.unwrap().is_none());
}

#[tokio::test]
async fn list_individuals_filters_and_orders() {
  let s = store().await;
  let zhang = s.create_individual(person("张三", Sex::Male, 1950)).await.unwrap();
  let li = s.create_individual(person("李四", Sex::Female, 1952)).await.unwrap();
  let wang = s.create_individual(person("王五", Sex::Male, 1960)).await.unwrap();

  let newest = s
    .list_individuals(&IndividualQuery { order: IndividualOrder::CreatedDesc, ..Default::default() })
    .await
    .unwrap();
  let ids: Vec<_> = newest.iter().map(|p| p.id).collect();
  assert_eq!(ids, vec![wang.id, li.id, zhang.id]);

  let found = s
    .list_individuals(&IndividualQuery { name_contains: Some("四".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].id, li.id);

  let picked = s.list_individuals(&IndividualQuery::by_ids([zhang.id, wang.id])).await.unwrap();
  assert_eq!(picked.len(), 2);

  let none = s.list_individuals(&IndividualQuery::by_ids([])).await.unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn name_search_escapes_wildcards() {
  let s = store().await;
  s.create_individual(person("张三", Sex::Male, 1950)).await.unwrap();
  let found = s
    .list_individuals(&IndividualQuery { name_contains: Some("%".into()), ..Default::default() })
    .await
    .unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn update_individual_sets_and_clears() {
  let s = store().await;
  let mut input = person("张三", Sex::Male, 1950);
  input.biography = Some("教师".into());
  let created = s.create_individual(input).await.unwrap();

  let patch = IndividualPatch {
    full_name: Some("张叁".into()),
    death_date: Some(Some(date(2020, 5, 1))),
    biography: Some(None),
    ..Default::default()
  };
  let updated = s.update_individual(created.id, patch).await.unwrap().unwrap();
  assert_eq!(updated.full_name, "张叁");
  assert_eq!(updated.death_date, Some(date(2020, 5, 1)));
  assert_eq!(updated.biography, None);
  assert_eq!(updated.birth_place, "北京");
  assert_eq!(updated.created_at, created.created_at);

  let missing = s.update_individual(999, IndividualPatch::default()).await.unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn delete_individual_cascades_relationships() {
  let s = store().await;
  let father = s.create_individual(person("张父", Sex::Male, 1920)).await.unwrap();
  let son = s.create_individual(person("张三", Sex::Male, 1950)).await.unwrap();
  let wife = s.create_individual(person("李四", Sex::Female, 1952)).await.unwrap();
  s.create_relationship(NewRelationship::parent(father.id, son.id)).await.unwrap();
  s.create_relationship(NewRelationship::spouse(son.id, wife.id)).await.unwrap();

  assert!(s.delete_individual(son.id).await.unwrap());
  assert!(!s.delete_individual(son.id).await.unwrap());

  let left = s.list_relationships(&RelationshipQuery::default()).await.unwrap();
  assert!(left.is_empty());
}

// ─── Relationships ───────────────────────────────────────────────────────────

#[tokio::test]
async fn relationships_query_by_individual() {
  let s = store().await;
  let a = s.create_individual(person("张父", Sex::Male, 1920)).await.unwrap();
  let b = s.create_individual(person("张三", Sex::Male, 1950)).await.unwrap();
  let c = s.create_individual(person("李四", Sex::Female, 1952)).await.unwrap();
  let first = s.create_relationship(NewRelationship::parent(a.id, b.id)).await.unwrap();
  let second = s.create_relationship(NewRelationship::spouse(b.id, c.id)).await.unwrap();

  let of_c = s
    .list_relationships(&RelationshipQuery { involving: Some(c.id), newest_first: false })
    .await
    .unwrap();
  assert_eq!(of_c.len(), 1);
  assert_eq!(of_c[0].kind, RelationshipKind::Spouse);

  let newest = s
    .list_relationships(&RelationshipQuery { involving: Some(b.id), newest_first: true })
    .await
    .unwrap();
  let ids: Vec<_> = newest.iter().map(|r| r.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);

  let fetched = s.get_relationship(first.id).await.unwrap().unwrap();
  assert_eq!(fetched.person_a_id, a.id);
  assert!(s.delete_relationship(first.id).await.unwrap());
  assert!(s.get_relationship(first.id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_relationship_is_rejected_by_store() {
  let s = store().await;
  let a = s.create_individual(person("张三", Sex::Male, 1950)).await.unwrap();
  let b = s.create_individual(person("李四", Sex::Female, 1952)).await.unwrap();
  s.create_relationship(NewRelationship::spouse(a.id, b.id)).await.unwrap();
  assert!(s.create_relationship(NewRelationship::spouse(a.id, b.id)).await.is_err());
}

#[tokio::test]
async fn relationship_requires_existing_endpoints() {
  let s = store().await;
  let a = s.create_individual(person("张三", Sex::Male, 1950)).await.unwrap();
  assert!(s.create_relationship(NewRelationship::parent(a.id, 777)).await.is_err());
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn events_newest_date_first_and_patchable() {
  let s = store().await;
  let old = s
    .create_event(NewEvent {
      title:       "修谱".into(),
      date:        date(1990, 3, 1),
      description: "第一次修谱".into(),
    })
    .await
    .unwrap();
  let new = s
    .create_event(NewEvent {
      title:       "祭祖".into(),
      date:        date(2023, 4, 5),
      description: "清明祭祖".into(),
    })
    .await
    .unwrap();

  let ids: Vec<_> = s.list_events().await.unwrap().iter().map(|e| e.id).collect();
  assert_eq!(ids, vec![new.id, old.id]);

  let patched = s
    .update_event(old.id, EventPatch { title: Some("续谱".into()), ..Default::default() })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(patched.title, "续谱");
  assert_eq!(patched.description, "第一次修谱");

  assert!(s.delete_event(old.id).await.unwrap());
  assert!(s.get_event(old.id).await.unwrap().is_none());
  assert!(s.update_event(old.id, EventPatch::default()).await.unwrap().is_none());
}

// ─── Identity ────────────────────────────────────────────────────────────────

async fn confirmed_account(s: &SqliteStore, email: &str) -> Uuid {
  let SignUp::PendingVerification { account_id, verification_token } =
    s.sign_up(email, "hunter22").await.unwrap()
  else {
    panic!("expected a new account");
  };
  assert!(s.confirm_email(&verification_token).await.unwrap());
  account_id
}

#[tokio::test]
async fn sign_up_creates_user_profile() {
  let s = store().await;
  let id = confirmed_account(&s, "Admin@Example.com").await;
  let profile = s.get_profile(id).await.unwrap().unwrap();
  assert_eq!(profile.role, Role::User);
  assert_eq!(s.account_id_by_email("admin@example.com").await.unwrap(), Some(id));

  let again = s.sign_up("admin@example.com", "other").await.unwrap();
  assert_eq!(again, SignUp::EmailTaken);
}

#[tokio::test]
async fn sign_in_requires_confirmation_and_password() {
  let s = store().await;
  let SignUp::PendingVerification { verification_token, .. } =
    s.sign_up("a@example.com", "hunter22").await.unwrap()
  else {
    panic!("expected a new account");
  };

  let early = s.sign_in("a@example.com", "hunter22").await.unwrap();
  assert!(matches!(early, SignIn::EmailNotConfirmed));

  assert!(s.confirm_email(&verification_token).await.unwrap());
  assert!(!s.confirm_email(&verification_token).await.unwrap());

  let wrong = s.sign_in("a@example.com", "nope").await.unwrap();
  assert!(matches!(wrong, SignIn::InvalidCredentials));
  let unknown = s.sign_in("b@example.com", "hunter22").await.unwrap();
  assert!(matches!(unknown, SignIn::InvalidCredentials));

  let SignIn::Session(session) = s.sign_in(" A@example.com ", "hunter22").await.unwrap() else {
    panic!("expected a session");
  };
  assert_eq!(session.email, "a@example.com");
  let resolved = s.get_session(&session.token).await.unwrap().unwrap();
  assert_eq!(resolved.account_id, session.account_id);

  s.sign_out(&session.token).await.unwrap();
  assert!(s.get_session(&session.token).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_sessions_do_not_resolve() {
  let s = store().await.with_session_ttl(Duration::zero());
  confirmed_account(&s, "a@example.com").await;
  let SignIn::Session(session) = s.sign_in("a@example.com", "hunter22").await.unwrap() else {
    panic!("expected a session");
  };
  assert!(s.get_session(&session.token).await.unwrap().is_none());
}

#[tokio::test]
async fn unrepresentable_expiry_fails_sign_in() {
  let s = store().await.with_session_ttl(Duration::days(1_000_000_000));
  confirmed_account(&s, "a@example.com").await;
  let result = s.sign_in("a@example.com", "hunter22").await;
  assert!(matches!(result, Err(crate::Error::SessionTtl(_))));
}

#[tokio::test]
async fn update_role_and_list_accounts() {
  let s = store().await;
  let first = confirmed_account(&s, "first@example.com").await;
  let second = confirmed_account(&s, "second@example.com").await;

  let promoted = s.update_role(first, Role::Admin).await.unwrap().unwrap();
  assert!(promoted.is_admin());
  assert!(s.update_role(Uuid::new_v4(), Role::Admin).await.unwrap().is_none());

  let accounts = s.list_accounts().await.unwrap();
  assert_eq!(accounts.len(), 2);
  assert_eq!(accounts[0].profile.account_id, first);
  assert_eq!(accounts[0].email, "first@example.com");
  assert_eq!(accounts[1].profile.account_id, second);
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_entries_newest_first_with_filter_and_paging() {
  let s = store().await;
  let actor = Uuid::new_v4();
  for i in 0..3 {
    s.append(NewAuditEntry::new(Some(actor), AuditAction::CreateIndividual).with("n", i))
      .await
      .unwrap();
  }
  s.append(NewAuditEntry::new(None, AuditAction::UserLogin)).await.unwrap();

  let all = s.list_entries(&AuditQuery::default()).await.unwrap();
  assert_eq!(all.len(), 4);
  assert_eq!(all[0].action, "USER_LOGIN");
  assert_eq!(all[0].actor_id, None);

  let creates = s
    .list_entries(&AuditQuery {
      action: Some("CREATE_INDIVIDUAL".into()),
      limit:  2,
      offset: 0,
    })
    .await
    .unwrap();
  assert_eq!(creates.len(), 2);
  assert_eq!(creates[0].details["n"], 2);
  assert_eq!(creates[0].actor_id, Some(actor));

  let page_two = s
    .list_entries(&AuditQuery {
      action: Some("CREATE_INDIVIDUAL".into()),
      limit:  2,
      offset: 2,
    })
    .await
    .unwrap();
  assert_eq!(page_two.len(), 1);
  assert_eq!(page_two[0].details["n"], 0);
}
