//! Form and dashboard page models against the simulated shop

mod support;

use support::{ShopQuirks, SimLauncher, SimShop};
use test_case::test_case;
use tourpay_common::{
    CardFactory, CardField, CardRecord, ExpiryCalendar, Faker, Outcome, TransactionKind, Warning,
    DECLINED_CARD_NUMBER,
};
use tourpay_e2e::{
    BrowserDriver, Dashboard, E2eError, FailureKind, FormState, Locale, Timeouts, UiText,
};

const BASE_URL: &str = "http://shop.test";

fn timeouts() -> Timeouts {
    Timeouts {
        element: std::time::Duration::from_millis(300),
        outcome: std::time::Duration::from_millis(500),
        poll: std::time::Duration::from_millis(10),
    }
}

fn factory() -> CardFactory {
    CardFactory::new(ExpiryCalendar::today(), Faker::seeded(7))
}

#[tokio::test]
async fn test_declined_card_shows_declined_banner() {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop.clone(), Locale::En).browser();
    let text = UiText::for_locale(Locale::En);
    let expiry = ExpiryCalendar::today().years_from_now(1);
    let card = CardRecord::new(
        DECLINED_CARD_NUMBER,
        expiry.month_str(),
        expiry.year_str(),
        "Jane Doe",
        "123",
    );

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_payment().await.unwrap();
    form.fill(&card).await.unwrap();
    form.expect_declined().await.unwrap();
    form.expect_no_warnings().await.unwrap();

    assert_eq!(form.state(), FormState::SubmittedValid);
    assert_eq!(shop.count("payment_entity"), 1);
}

#[test_case(TransactionKind::Payment ; "payment")]
#[test_case(TransactionKind::Credit ; "credit")]
#[tokio::test]
async fn test_blank_submit_then_fill(kind: TransactionKind) {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop.clone(), Locale::Ru).browser();
    let text = UiText::for_locale(Locale::Ru);
    let mut cards = factory();

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_form(kind).await.unwrap();
    assert_eq!(form.state(), FormState::Unsubmitted);

    form.submit().await.unwrap();
    for field in [CardField::Number, CardField::Month, CardField::Year, CardField::Cvc] {
        form.expect_field_warning(field, "Неверный формат").await.unwrap();
    }
    form.expect_field_warning(CardField::Holder, "Поле обязательно для заполнения")
        .await
        .unwrap();
    assert_eq!(form.state(), FormState::SubmittedInvalid);

    form.fill(&cards.approved()).await.unwrap();
    form.expect_outcome(&Outcome::Approved).await.unwrap();
    assert_eq!(form.submissions(), 2);
    assert_eq!(form.state(), FormState::SubmittedValid);
}

#[tokio::test]
async fn test_single_digit_month_is_accepted() {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop, Locale::En).browser();
    let text = UiText::for_locale(Locale::En);
    let mut cards = factory();
    let year = cards.valid_expiry().year_str();

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_credit().await.unwrap();
    form.fill(&cards.with_month_year("5", &year)).await.unwrap();
    form.expect_outcome(&Outcome::Approved).await.unwrap();
}

#[test_case(TransactionKind::Payment, "Имя не должно быть длинее 21 символа" ; "payment wording")]
#[test_case(TransactionKind::Credit, "Имя и фамилия не должны быть длиннее 21 символа" ; "credit wording")]
#[tokio::test]
async fn test_too_long_holder_wording(kind: TransactionKind, expected: &str) {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop.clone(), Locale::Ru).browser();
    let text = UiText::for_locale(Locale::Ru);
    let mut cards = factory();

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_form(kind).await.unwrap();
    form.fill(&cards.with_holder_name_of_length(22)).await.unwrap();
    form.expect_field_warning(CardField::Holder, expected).await.unwrap();
    form.expect_outcome(&Outcome::rejected(CardField::Holder, Warning::TooLong))
        .await
        .unwrap();

    // Rejected submissions never reach storage
    assert_eq!(shop.count("payment_entity") + shop.count("credit_request_entity"), 0);
}

#[tokio::test]
async fn test_wrong_warning_text_is_an_assertion_failure() {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop, Locale::En).browser();
    let text = UiText::for_locale(Locale::En);
    let mut cards = factory();

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_payment().await.unwrap();
    form.fill(&cards.with_holder_name("Иванов Иван")).await.unwrap();

    let err = form
        .expect_warning(CardField::Holder, Warning::TooLong)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Assertion);
    form.expect_warning(CardField::Holder, Warning::ForbiddenCharacters)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_absent_warning_is_an_assertion_failure() {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop, Locale::En).browser();
    let text = UiText::for_locale(Locale::En);
    let mut cards = factory();

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_payment().await.unwrap();
    form.fill(&cards.approved().with_field(CardField::Cvc, "12")).await.unwrap();

    // Only the cvc is rejected; the holder warning never appears
    let err = form
        .expect_warning(CardField::Holder, Warning::Required)
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::AssertionFailed(_)), "{}", err);
    assert_eq!(err.kind(), FailureKind::Assertion);
}

#[tokio::test]
async fn test_lenient_shop_fails_rejection_expectation() {
    let shop = SimShop::with_quirks(ShopQuirks {
        holder_max_len: 30,
        ..Default::default()
    });
    let browser = SimLauncher::new(shop, Locale::En).browser();
    let text = UiText::for_locale(Locale::En);
    let mut cards = factory();

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_payment().await.unwrap();
    form.fill(&cards.with_holder_name_of_length(22)).await.unwrap();

    let err = form
        .expect_outcome(&Outcome::rejected(CardField::Holder, Warning::TooLong))
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::AssertionFailed(_)), "{}", err);
}

#[tokio::test]
async fn test_missing_banner_times_out() {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop, Locale::En).browser();
    let text = UiText::for_locale(Locale::En);
    let mut cards = factory();

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_payment().await.unwrap();
    form.fill(&cards.declined()).await.unwrap();

    let err = form.expect_approved().await.unwrap_err();
    assert!(matches!(err, E2eError::Timeout { .. }), "{}", err);
    assert_eq!(err.kind(), FailureKind::Infrastructure);
}

#[tokio::test]
async fn test_wrong_locale_cannot_find_dashboard() {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop, Locale::Ru).browser();
    let text = UiText::for_locale(Locale::En);

    let result = Dashboard::open(&browser, BASE_URL, text, timeouts()).await;
    assert!(matches!(result, Err(E2eError::Timeout { .. })));
}

#[tokio::test]
async fn test_closed_session_rejects_actions() {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop, Locale::En).browser();
    browser.close().await.unwrap();

    let err = browser.goto(BASE_URL).await.unwrap_err();
    assert!(matches!(err, E2eError::SessionClosed(_)));
}

#[tokio::test]
async fn test_corrected_field_clears_only_its_own_warning() {
    let shop = SimShop::new();
    let browser = SimLauncher::new(shop, Locale::En).browser();
    let text = UiText::for_locale(Locale::En);
    let mut cards = factory();

    let dashboard = Dashboard::open(&browser, BASE_URL, text, timeouts()).await.unwrap();
    let mut form = dashboard.open_payment().await.unwrap();

    let card = cards
        .approved()
        .with_field(CardField::Holder, "")
        .with_field(CardField::Cvc, "12");
    form.fill(&card).await.unwrap();
    form.expect_warning(CardField::Holder, Warning::Required).await.unwrap();
    form.expect_warning(CardField::Cvc, Warning::InvalidFormat).await.unwrap();

    let corrected = card.with_field(CardField::Holder, "Jane Doe");
    form.fill(&corrected).await.unwrap();
    form.expect_outcome(&Outcome::rejected(CardField::Cvc, Warning::InvalidFormat))
        .await
        .unwrap();
}
