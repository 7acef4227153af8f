//! In-process stand-in for the tour shop
//!
//! `SimShop` owns a SQLite file with the shop's three tables. It backs both
//! the simulated browser (`SimLauncher`) and the HTTP API (`serve_api`), so a
//! purchase made through either surface is visible to `PersistenceVerifier`.
//! Validation here is written against the shop's published rules, not against
//! `tourpay_common::classify`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, Local, NaiveDate};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use tourpay_common::{CardField, CardRecord, TransactionKind};
use tourpay_e2e::config::{DbConfig, HarnessConfig};
use tourpay_e2e::{
    BrowserDriver, BrowserLauncher, E2eError, E2eResult, Locale, Locator, PersistenceVerifier,
    UiText,
};

pub const SCHEMA: &str = r#"
    CREATE TABLE payment_entity (
        id TEXT PRIMARY KEY,
        amount INTEGER,
        created TEXT NOT NULL,
        status TEXT NOT NULL,
        transaction_id TEXT
    );
    CREATE TABLE credit_request_entity (
        id TEXT PRIMARY KEY,
        bank_id TEXT,
        created TEXT NOT NULL,
        status TEXT NOT NULL
    );
    CREATE TABLE order_entity (
        id TEXT PRIMARY KEY,
        created TEXT NOT NULL,
        credit_id TEXT,
        payment_id TEXT
    );
"#;

const TOUR_PRICE: i64 = 4_500_000;
const APPROVED_DIGITS: &str = "4444444444444441";

/// Deviations from the correct shop, for negative tests
#[derive(Debug, Clone, Copy)]
pub struct ShopQuirks {
    pub holder_max_len: usize,
    /// Store every API purchase as APPROVED
    pub approve_everything: bool,
    /// Leave order_entity untouched
    pub skip_orders: bool,
}

impl Default for ShopQuirks {
    fn default() -> Self {
        Self {
            holder_max_len: 21,
            approve_everything: false,
            skip_orders: false,
        }
    }
}

struct ShopInner {
    conn: Connection,
    next_id: u64,
}

#[derive(Clone)]
pub struct SimShop {
    inner: Arc<Mutex<ShopInner>>,
    db_path: PathBuf,
    pub quirks: ShopQuirks,
    _dir: Arc<TempDir>,
}

impl SimShop {
    pub fn new() -> Self {
        Self::with_quirks(ShopQuirks::default())
    }

    pub fn with_quirks(quirks: ShopQuirks) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("app.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        Self {
            inner: Arc::new(Mutex::new(ShopInner { conn, next_id: 1 })),
            db_path,
            quirks,
            _dir: Arc::new(dir),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: format!("sqlite://{}", self.db_path.display()),
            ..Default::default()
        }
    }

    pub async fn verifier(&self) -> PersistenceVerifier {
        PersistenceVerifier::open(&self.db_config()).await.unwrap()
    }

    pub fn count(&self, table: &str) -> i64 {
        let inner = self.inner.lock().unwrap();
        inner
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    /// Bank decision for a card that passed validation
    pub fn decide(&self, number: &str) -> &'static str {
        let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits == APPROVED_DIGITS || self.quirks.approve_everything {
            "APPROVED"
        } else {
            "DECLINED"
        }
    }

    /// Store a purchase the way the shop does
    pub fn record(&self, kind: TransactionKind, status: &str) {
        let mut inner = self.inner.lock().unwrap();
        let n = inner.next_id;
        inner.next_id += 1;
        let created = Local::now()
            .naive_local()
            .format("%Y-%m-%d %H:%M:%S%.6f")
            .to_string();

        let reference = match kind {
            TransactionKind::Payment => {
                let tx = format!("tx-{}", n);
                inner
                    .conn
                    .execute(
                        "INSERT INTO payment_entity VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![format!("pay-{}", n), TOUR_PRICE, created, status, tx],
                    )
                    .unwrap();
                tx
            }
            TransactionKind::Credit => {
                let bank = format!("bank-{}", n);
                inner
                    .conn
                    .execute(
                        "INSERT INTO credit_request_entity VALUES (?1, ?2, ?3, ?4)",
                        params![format!("cred-{}", n), bank, created, status],
                    )
                    .unwrap();
                bank
            }
        };

        if !self.quirks.skip_orders {
            let (credit_id, payment_id) = match kind {
                TransactionKind::Payment => (None, Some(reference)),
                TransactionKind::Credit => (Some(reference), None),
            };
            inner
                .conn
                .execute(
                    "INSERT INTO order_entity VALUES (?1, ?2, ?3, ?4)",
                    params![format!("order-{}", n), created, credit_id, payment_id],
                )
                .unwrap();
        }
    }

    /// Warnings the web form renders for these inputs, keyed by field
    pub fn validate(
        &self,
        text: &UiText,
        kind: TransactionKind,
        card: &CardRecord,
    ) -> HashMap<CardField, &'static str> {
        let today = Local::now().date_naive();
        validate_at(today, text, kind, card, self.quirks.holder_max_len)
    }
}

pub fn validate_at(
    today: NaiveDate,
    text: &UiText,
    kind: TransactionKind,
    card: &CardRecord,
    holder_max_len: usize,
) -> HashMap<CardField, &'static str> {
    let mut out = HashMap::new();
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    let number_digits = card.number.bytes().filter(u8::is_ascii_digit).count();
    let number_chars_ok = card.number.bytes().all(|b| b.is_ascii_digit() || b == b' ');
    if !number_chars_ok || number_digits != 16 {
        out.insert(CardField::Number, text.invalid_format);
    }

    let month = if !card.month.is_empty() && card.month.len() <= 2 && all_digits(&card.month) {
        card.month.parse::<u32>().ok()
    } else {
        None
    };
    let year = if card.year.len() == 2 && all_digits(&card.year) {
        card.year.parse::<i32>().ok().map(|yy| {
            let base = today.year() - today.year().rem_euclid(100);
            let mut full = base + yy;
            if full < today.year() - 50 {
                full += 100;
            } else if full > today.year() + 49 {
                full -= 100;
            }
            full
        })
    } else {
        None
    };

    match month {
        None => {
            out.insert(CardField::Month, text.invalid_format);
        }
        Some(m) if m == 0 || m > 12 => {
            out.insert(CardField::Month, text.invalid_validity_period);
        }
        Some(m) => {
            if let Some(y) = year {
                let months = |y: i32, m: u32| y * 12 + m as i32;
                let now = months(today.year(), today.month());
                let card_at = months(y, m);
                if y >= today.year() && (card_at < now || card_at > now + 60) {
                    out.insert(CardField::Month, text.invalid_validity_period);
                }
            }
        }
    }

    match year {
        None => {
            out.insert(CardField::Year, text.invalid_format);
        }
        Some(y) if y < today.year() => {
            out.insert(CardField::Year, text.expired);
        }
        Some(_) => {}
    }

    let holder = &card.holder;
    let holder_len = holder.chars().count();
    if holder.is_empty() {
        out.insert(CardField::Holder, text.required);
    } else if !holder
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '-')
    {
        out.insert(CardField::Holder, text.forbidden_characters);
    } else if holder_len < 2 {
        out.insert(CardField::Holder, text.too_short);
    } else if holder_len > holder_max_len {
        let msg = match kind {
            TransactionKind::Payment => text.too_long_payment,
            TransactionKind::Credit => text.too_long_credit,
        };
        out.insert(CardField::Holder, msg);
    }

    if card.cvc.len() != 3 || !all_digits(&card.cvc) {
        out.insert(CardField::Cvc, text.invalid_format);
    }

    out
}

// ---------------------------------------------------------------------------
// Simulated browser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    DashboardHeading,
    FormHeading(TransactionKind),
    OpenButton(TransactionKind),
    Continue,
    ApprovedBanner,
    DeclinedBanner,
    Input(CardField),
    Warning(CardField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Blank,
    Dashboard,
    Form(TransactionKind),
}

struct PageState {
    page: Page,
    inputs: CardRecord,
    warnings: HashMap<CardField, &'static str>,
    banner: Option<Element>,
    closed: bool,
}

pub struct SimBrowser {
    shop: SimShop,
    text: &'static UiText,
    elements: HashMap<Locator, Element>,
    state: Mutex<PageState>,
    closed_counter: Arc<AtomicUsize>,
}

impl SimBrowser {
    fn new(shop: SimShop, text: &'static UiText, closed_counter: Arc<AtomicUsize>) -> Self {
        let mut elements = HashMap::new();
        elements.insert(Locator::heading(2, text.dashboard_heading), Element::DashboardHeading);
        for kind in TransactionKind::ALL {
            elements.insert(Locator::heading(3, text.heading(kind)), Element::FormHeading(kind));
            elements.insert(Locator::button(text.open_button(kind)), Element::OpenButton(kind));
        }
        elements.insert(Locator::button(text.continue_button), Element::Continue);
        elements.insert(Locator::banner(text.approved_banner), Element::ApprovedBanner);
        elements.insert(Locator::banner(text.declined_banner), Element::DeclinedBanner);
        for field in CardField::ALL {
            elements.insert(Locator::field_input(text.label(field)), Element::Input(field));
            elements.insert(Locator::field_warning(text.label(field)), Element::Warning(field));
        }

        Self {
            shop,
            text,
            elements,
            state: Mutex::new(PageState {
                page: Page::Blank,
                inputs: CardRecord::blank(),
                warnings: HashMap::new(),
                banner: None,
                closed: false,
            }),
            closed_counter,
        }
    }

    fn resolve(&self, locator: &Locator) -> E2eResult<Element> {
        self.elements
            .get(locator)
            .copied()
            .ok_or_else(|| E2eError::Playwright(format!("no element matches {}", locator)))
    }

    fn open_state(&self) -> E2eResult<std::sync::MutexGuard<'_, PageState>> {
        let state = self.state.lock().unwrap();
        if state.closed {
            return Err(E2eError::SessionClosed("page closed".to_string()));
        }
        Ok(state)
    }

    fn visible(&self, state: &PageState, element: Element) -> bool {
        match (state.page, element) {
            (Page::Dashboard, Element::DashboardHeading) => true,
            (Page::Dashboard | Page::Form(_), Element::OpenButton(_)) => true,
            (Page::Form(k), Element::FormHeading(f)) => k == f,
            (Page::Form(_), Element::Continue | Element::Input(_)) => true,
            (Page::Form(_), Element::Warning(field)) => state.warnings.contains_key(&field),
            (Page::Form(_), banner @ (Element::ApprovedBanner | Element::DeclinedBanner)) => {
                state.banner == Some(banner)
            }
            _ => false,
        }
    }

    fn element_text(&self, state: &PageState, element: Element) -> Option<String> {
        if !self.visible(state, element) {
            return None;
        }
        let text = match element {
            Element::DashboardHeading => self.text.dashboard_heading,
            Element::FormHeading(kind) => self.text.heading(kind),
            Element::OpenButton(kind) => self.text.open_button(kind),
            Element::Continue => self.text.continue_button,
            Element::ApprovedBanner => self.text.approved_banner,
            Element::DeclinedBanner => self.text.declined_banner,
            Element::Input(field) => return Some(state.inputs.field(field).to_string()),
            Element::Warning(field) => state.warnings.get(&field).copied().unwrap_or_default(),
        };
        Some(text.to_string())
    }
}

#[async_trait]
impl BrowserDriver for SimBrowser {
    async fn goto(&self, _url: &str) -> E2eResult<()> {
        let mut state = self.open_state()?;
        state.page = Page::Dashboard;
        state.inputs = CardRecord::blank();
        state.warnings.clear();
        state.banner = None;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        let element = self.resolve(locator)?;
        let mut state = self.open_state()?;
        if !self.visible(&state, element) {
            return Err(E2eError::Playwright(format!("{} is not visible", locator)));
        }
        match element {
            Element::OpenButton(kind) => {
                state.page = Page::Form(kind);
                state.inputs = CardRecord::blank();
                state.warnings.clear();
                state.banner = None;
            }
            Element::Continue => {
                let Page::Form(kind) = state.page else {
                    return Ok(());
                };
                let warnings = self.shop.validate(self.text, kind, &state.inputs);
                if warnings.is_empty() {
                    let status = self.shop.decide(&state.inputs.number);
                    self.shop.record(kind, status);
                    state.banner = Some(if status == "APPROVED" {
                        Element::ApprovedBanner
                    } else {
                        Element::DeclinedBanner
                    });
                } else {
                    state.banner = None;
                }
                state.warnings = warnings;
            }
            _ => {}
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        let element = self.resolve(locator)?;
        let mut state = self.open_state()?;
        match element {
            Element::Input(field) if self.visible(&state, element) => {
                let filled = std::mem::take(&mut state.inputs).with_field(field, value);
                state.inputs = filled;
                Ok(())
            }
            _ => Err(E2eError::Playwright(format!("{} is not an input", locator))),
        }
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let state = self.open_state()?;
        Ok(self
            .elements
            .get(locator)
            .map(|e| self.visible(&state, *e))
            .unwrap_or(false))
    }

    async fn text(&self, locator: &Locator) -> E2eResult<Option<String>> {
        let state = self.open_state()?;
        Ok(self
            .elements
            .get(locator)
            .and_then(|e| self.element_text(&state, *e)))
    }

    async fn close(&self) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.closed {
            state.closed = true;
            self.closed_counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out `SimBrowser`s and counts opened/closed sessions
#[derive(Clone)]
pub struct SimLauncher {
    shop: SimShop,
    text: &'static UiText,
    pub launched: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl SimLauncher {
    pub fn new(shop: SimShop, locale: Locale) -> Self {
        Self {
            shop,
            text: UiText::for_locale(locale),
            launched: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn browser(&self) -> SimBrowser {
        SimBrowser::new(self.shop.clone(), self.text, self.closed.clone())
    }
}

#[async_trait]
impl BrowserLauncher for SimLauncher {
    async fn launch(&self) -> E2eResult<Box<dyn BrowserDriver>> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.browser()))
    }
}

// ---------------------------------------------------------------------------
// Simulated API
// ---------------------------------------------------------------------------

type ApiReply = (StatusCode, Json<serde_json::Value>);

async fn create(shop: &SimShop, kind: TransactionKind, card: CardRecord) -> ApiReply {
    let status = shop.decide(&card.number);
    shop.record(kind, status);
    (StatusCode::OK, Json(serde_json::json!({ "status": status })))
}

async fn pay(State(shop): State<SimShop>, Json(card): Json<CardRecord>) -> ApiReply {
    create(&shop, TransactionKind::Payment, card).await
}

async fn credit(State(shop): State<SimShop>, Json(card): Json<CardRecord>) -> ApiReply {
    create(&shop, TransactionKind::Credit, card).await
}

/// Serve the two purchase endpoints on an ephemeral port; returns the base URL
pub async fn serve_api(shop: SimShop) -> String {
    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/v1/pay", post(pay))
        .route("/api/v1/credit", post(credit))
        .with_state(shop);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Harness configuration pointing at `shop` served from `base_url`
pub fn harness_config(shop: &SimShop, base_url: &str, locale: Locale) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.base_url = base_url.to_string();
    config.db = shop.db_config();
    config.ui.locale = locale;
    config.ui.element_timeout_ms = 300;
    config.ui.outcome_timeout_ms = 500;
    config.ui.poll_interval_ms = 10;
    config.run.output_dir = shop.db_path().parent().unwrap().join("results");
    config
}
