//! Integration tests for `SqliteStore` against an in-memory database.

use arcade_core::{
  Error,
  cart::{CartSort, LibrarySort},
  game::{AgeRating, Game, GamePatch, NewGame, NewPublisher, Publisher, PublisherPatch},
  invoice::Invoice,
  money::TaxRate,
  page::{Order, PageRequest},
  store::LedgerStore,
  user::{NewUser, TaxIdentity, User, UserPatch},
};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::SqliteStore;

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub(crate) async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

pub(crate) fn dec(units: i64, scale: u32) -> Decimal { Decimal::new(units, scale) }

pub(crate) fn adult_user(tag: &str, balance: Decimal) -> NewUser {
  NewUser {
    username:      tag.to_owned(),
    email:         format!("{tag}@example.com"),
    display_name:  format!("User {tag}"),
    date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
    tax:           TaxIdentity { country: "PT".into(), vatin: format!("U-{tag}") },
    balance,
  }
}

pub(crate) fn publisher(tag: &str) -> NewPublisher {
  NewPublisher {
    email: format!("{tag}@publisher.example"),
    name:  format!("Publisher {tag}"),
    tax:   TaxIdentity { country: "FR".into(), vatin: format!("P-{tag}") },
  }
}

pub(crate) fn released_game(publisher_id: Uuid, title: &str, price: Decimal) -> NewGame {
  NewGame {
    publisher_id,
    title: title.into(),
    price,
    is_active: true,
    release_date: Some(Utc::now() - Duration::days(30)),
    age_rating: AgeRating::from("0"),
  }
}

pub(crate) async fn seed_user(s: &SqliteStore, tag: &str, balance: Decimal) -> User {
  let input = adult_user(tag, balance);
  s.read_write(move |tx| tx.create_user(&input)).await.unwrap()
}

pub(crate) async fn seed_publisher(s: &SqliteStore, tag: &str) -> Publisher {
  let input = publisher(tag);
  s.read_write(move |tx| tx.create_publisher(&input)).await.unwrap()
}

pub(crate) async fn seed_game(s: &SqliteStore, publisher_id: Uuid, title: &str, price: Decimal) -> Game {
  let input = released_game(publisher_id, title, price);
  s.read_write(move |tx| tx.create_game(&input)).await.unwrap()
}

async fn cart(s: &SqliteStore, user_id: Uuid, game_id: Uuid) {
  s.read_write(move |tx| tx.insert_cart_entry(user_id, game_id))
    .await
    .unwrap();
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;
  let user = seed_user(&s, "alice", dec(3000, 2)).await;

  let id = user.user_id;
  let fetched = s.read_only(move |tx| tx.get_user(id)).await.unwrap().unwrap();
  assert_eq!(fetched.username, "alice");
  assert_eq!(fetched.balance, dec(3000, 2));
  assert_eq!(fetched.date_of_birth, user.date_of_birth);
  assert_eq!(fetched.tax, user.tax);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  let result = s.read_only(|tx| tx.get_user(Uuid::new_v4())).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn duplicate_identity_fields_are_conflicts() {
  let s = store().await;
  seed_user(&s, "alice", Decimal::ZERO).await;

  let mut same_name = adult_user("bob", Decimal::ZERO);
  same_name.username = "alice".into();
  let err = s.read_write(move |tx| tx.create_user(&same_name)).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyExists("username")), "{err:?}");

  let mut same_email = adult_user("carol", Decimal::ZERO);
  same_email.email = "alice@example.com".into();
  let err = s.read_write(move |tx| tx.create_user(&same_email)).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyExists("email")), "{err:?}");
}

#[tokio::test]
async fn patch_user_keeps_the_balance_and_unpatched_fields() {
  let s = store().await;
  let user = seed_user(&s, "alice", dec(3000, 2)).await;
  seed_user(&s, "bob", Decimal::ZERO).await;

  let id = user.user_id;
  let patch = UserPatch { display_name: Some("Alice L.".into()), ..Default::default() };
  let patched = s.read_write(move |tx| tx.patch_user(id, &patch)).await.unwrap();
  assert_eq!(patched.display_name, "Alice L.");
  assert_eq!(patched.username, "alice");
  assert_eq!(patched.balance, dec(3000, 2));

  let patch = UserPatch { username: Some("bob".into()), ..Default::default() };
  let err = s
    .read_write(move |tx| tx.patch_user(id, &patch))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyExists("username")), "{err:?}");

  let err = s
    .read_write(|tx| tx.patch_user(Uuid::new_v4(), &UserPatch::default()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));
}

#[tokio::test]
async fn negative_balance_write_is_refused() {
  let s = store().await;
  let user = seed_user(&s, "alice", dec(10, 0)).await;

  let id = user.user_id;
  let err = s
    .read_write(move |tx| tx.set_balance(id, dec(-1, 0)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserBalanceInsufficient(_)));
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn writes_in_read_only_transaction_are_rejected() {
  let s = store().await;
  let input = adult_user("alice", Decimal::ZERO);
  let err = s.read_only(move |tx| tx.create_user(&input)).await.unwrap_err();
  assert!(matches!(err, Error::InvariantViolation(_)));

  let count = s
    .read_only(|tx| {
      let page = PageRequest::<CartSort>::default();
      tx.list_cart(Uuid::new_v4(), &page)
    })
    .await
    .unwrap();
  assert_eq!(count.total, 0);
}

#[tokio::test]
async fn failed_closure_rolls_back_its_writes() {
  let s = store().await;
  let input = adult_user("alice", Decimal::ZERO);

  let err = s
    .read_write(move |tx| {
      let user = tx.create_user(&input)?;
      Err::<User, _>(Error::UserCartEmpty(user.user_id))
    })
    .await
    .unwrap_err();
  let Error::UserCartEmpty(id) = err else { panic!("unexpected {err:?}") };

  let found = s.read_only(move |tx| tx.get_user(id)).await.unwrap();
  assert!(found.is_none());
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn game_requires_existing_publisher() {
  let s = store().await;
  let input = released_game(Uuid::new_v4(), "Orphan", dec(5, 0));
  let err = s.read_write(move |tx| tx.create_game(&input)).await.unwrap_err();
  assert!(matches!(err, Error::PublisherNotFound(_)));
}

#[tokio::test]
async fn patch_game_coalesces_fields() {
  let s = store().await;
  let p = seed_publisher(&s, "acme").await;
  let game = seed_game(&s, p.publisher_id, "Pong", dec(500, 2)).await;

  let id = game.game_id;
  let patch = GamePatch { is_active: Some(false), ..Default::default() };
  let patched = s.read_write(move |tx| tx.patch_game(id, &patch)).await.unwrap();
  assert!(!patched.is_active);
  assert_eq!(patched.title, "Pong");
  assert_eq!(patched.price, dec(500, 2));

  let patch = GamePatch { title: Some("Pong II".into()), ..Default::default() };
  let err = s
    .read_write(move |tx| tx.patch_game(Uuid::new_v4(), &patch))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::GameNotFound(_)));
}

#[tokio::test]
async fn patch_publisher_coalesces_fields() {
  let s = store().await;
  let p = seed_publisher(&s, "acme").await;
  seed_publisher(&s, "other").await;

  let id = p.publisher_id;
  let patch = PublisherPatch { name: Some("Acme Games".into()), ..Default::default() };
  let patched = s.read_write(move |tx| tx.patch_publisher(id, &patch)).await.unwrap();
  assert_eq!(patched.name, "Acme Games");
  assert_eq!(patched.email, p.email);
  assert_eq!(patched.tax, p.tax);

  let patch = PublisherPatch { vatin: Some("P-other".into()), ..Default::default() };
  let err = s
    .read_write(move |tx| tx.patch_publisher(id, &patch))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyExists("vatin")), "{err:?}");

  let err = s
    .read_write(|tx| tx.patch_publisher(Uuid::new_v4(), &PublisherPatch::default()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PublisherNotFound(_)));
}

// ─── Cart ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_cart_entry_is_conflict() {
  let s = store().await;
  let user = seed_user(&s, "alice", Decimal::ZERO).await;
  let p = seed_publisher(&s, "acme").await;
  let game = seed_game(&s, p.publisher_id, "Pong", dec(5, 0)).await;
  cart(&s, user.user_id, game.game_id).await;

  let (u, g) = (user.user_id, game.game_id);
  let err = s
    .read_write(move |tx| tx.insert_cart_entry(u, g))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserCartGameAlreadyExists { .. }));
}

#[tokio::test]
async fn dangling_cart_references_name_the_missing_side() {
  let s = store().await;
  let user = seed_user(&s, "alice", Decimal::ZERO).await;
  let p = seed_publisher(&s, "acme").await;
  let game = seed_game(&s, p.publisher_id, "Pong", dec(5, 0)).await;

  let g = game.game_id;
  let err = s
    .read_write(move |tx| tx.insert_cart_entry(Uuid::new_v4(), g))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)), "{err:?}");

  let u = user.user_id;
  let err = s
    .read_write(move |tx| tx.insert_cart_entry(u, Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::GameNotFound(_)), "{err:?}");
}

#[tokio::test]
async fn delete_absent_cart_entry_is_not_found() {
  let s = store().await;
  let user = seed_user(&s, "alice", Decimal::ZERO).await;

  let u = user.user_id;
  let err = s
    .read_write(move |tx| tx.delete_cart_entry(u, Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserCartGameNotFound { .. }));
}

#[tokio::test]
async fn list_cart_sorts_and_pages() {
  let s = store().await;
  let user = seed_user(&s, "alice", Decimal::ZERO).await;
  let p = seed_publisher(&s, "acme").await;
  for title in ["Bravo", "Alpha", "Delta", "Charlie"] {
    let game = seed_game(&s, p.publisher_id, title, dec(1, 0)).await;
    cart(&s, user.user_id, game.game_id).await;
  }

  let u = user.user_id;
  let page = s
    .read_only(move |tx| {
      tx.list_cart(u, &PageRequest::new(CartSort::GameTitle, Order::Asc, 2, 1))
    })
    .await
    .unwrap();
  assert_eq!(page.total, 4);
  let titles: Vec<_> = page.results.iter().map(|i| i.game.title.as_str()).collect();
  assert_eq!(titles, ["Bravo", "Charlie"]);
  assert_eq!(page.results[0].publisher_tax, p.tax);

  let page = s
    .read_only(move |tx| {
      tx.list_cart(u, &PageRequest::new(CartSort::CreatedAt, Order::Desc, 10, 0))
    })
    .await
    .unwrap();
  let titles: Vec<_> = page.results.iter().map(|i| i.game.title.as_str()).collect();
  assert_eq!(titles, ["Charlie", "Delta", "Alpha", "Bravo"]);
}

// ─── Purchase ────────────────────────────────────────────────────────────────

async fn draft_for(s: &SqliteStore, user: &User) -> Invoice {
  let snapshot = user.clone();
  s.read_only(move |tx| {
    let page = tx.list_cart(
      snapshot.user_id,
      &PageRequest::new(CartSort::CreatedAt, Order::Desc, 100, 0),
    )?;
    Invoice::draft(&snapshot, &page.results, TaxRate::default(), Utc::now())
  })
  .await
  .unwrap()
}

#[tokio::test]
async fn purchase_cart_moves_entries_and_records_invoice() {
  let s = store().await;
  let user = seed_user(&s, "alice", Decimal::ZERO).await;
  let p = seed_publisher(&s, "acme").await;
  let cheap = seed_game(&s, p.publisher_id, "Pong", dec(500, 2)).await;
  let dear = seed_game(&s, p.publisher_id, "Doom", dec(1500, 2)).await;
  cart(&s, user.user_id, cheap.game_id).await;
  cart(&s, user.user_id, dear.game_id).await;

  let invoice = draft_for(&s, &user).await;
  let recorded = invoice.clone();
  s.read_write(move |tx| tx.purchase_cart(&recorded)).await.unwrap();

  let u = user.user_id;
  let (cart, library, invoices) = s
    .read_only(move |tx| {
      let cart = tx.list_cart(u, &PageRequest::default())?;
      let library = tx.list_library(
        u,
        &PageRequest::new(LibrarySort::GamePrice, Order::Desc, 10, 0),
      )?;
      Ok((cart, library, tx.list_invoices(u)?))
    })
    .await
    .unwrap();

  assert_eq!(cart.total, 0);
  assert_eq!(library.total, 2);
  assert_eq!(library.results[0].game.game_id, dear.game_id);
  assert_eq!(invoices, vec![invoice.clone()]);
  assert_eq!(invoices[0].lines.len(), 2);
  assert_eq!(invoices[0].tax().unwrap(), dec(460, 2));
}

#[tokio::test]
async fn purchase_cart_of_owned_game_changes_nothing() {
  let s = store().await;
  let user = seed_user(&s, "alice", Decimal::ZERO).await;
  let p = seed_publisher(&s, "acme").await;
  let game = seed_game(&s, p.publisher_id, "Pong", dec(5, 0)).await;
  cart(&s, user.user_id, game.game_id).await;

  let first = draft_for(&s, &user).await;
  let second = Invoice { invoice_id: Uuid::new_v4(), ..first.clone() };
  s.read_write(move |tx| tx.purchase_cart(&first)).await.unwrap();
  // The engine never re-carts an owned game; the store must still refuse it.
  cart(&s, user.user_id, game.game_id).await;

  let u = user.user_id;
  let (err, cart_total, invoices) = s
    .read_write(move |tx| {
      let err = tx.purchase_cart(&second).unwrap_err();
      let cart_total = tx.list_cart(u, &PageRequest::default())?.total;
      Ok((err, cart_total, tx.list_invoices(u)?.len()))
    })
    .await
    .unwrap();

  assert!(matches!(err, Error::UserLibraryGameAlreadyExists { .. }), "{err:?}");
  assert_eq!(cart_total, 1);
  assert_eq!(invoices, 1);
}

