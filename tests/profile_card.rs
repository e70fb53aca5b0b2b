mod common;

use common::*;
use pagekit::{
    ConsoleLevel, ContactFormConfig, Error, Page, PageConfig, ProfileCardConfig,
    ProfileCardElements, ReadyState, Result,
};

const ORIGIN: i64 = 1_700_000_000_000;
const FALLBACK: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=fallback";

#[test]
fn initialization_renders_time_immediately() -> Result<()> {
    let page = profile_page(ORIGIN)?;
    page.assert_text(TIME, "1700000000000")?;
    page.assert_attr(TIME, "datetime", Some("2023-11-14T22:13:20.000Z"))?;

    let messages = console_messages(&page);
    assert_eq!(
        messages,
        vec![
            "Profile Card initialized successfully".to_string(),
            "Current timestamp: 1700000000000".to_string(),
            "All required test IDs are present".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn clock_refreshes_every_second() -> Result<()> {
    let mut page = profile_page(ORIGIN)?;

    page.advance_time(999)?;
    page.assert_text(TIME, "1700000000000")?;
    page.advance_time(1)?;
    page.assert_text(TIME, "1700000001000")?;
    page.assert_attr(TIME, "datetime", Some("2023-11-14T22:13:21.000Z"))?;

    // Each tick sees the clock at its own due time.
    page.advance_time(2500)?;
    page.assert_text(TIME, "1700000003000")?;
    assert_eq!(page.now_ms(), ORIGIN + 3500);

    let pending = page.pending_timers();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].due_at, ORIGIN + 4000);
    assert_eq!(pending[0].interval_ms, Some(1000));
    Ok(())
}

#[test]
fn update_time_reads_the_current_clock() -> Result<()> {
    let mut page = profile_page(ORIGIN)?;
    page.advance_time(1500)?;
    page.assert_text(TIME, "1700000001000")?;

    page.profile_card()
        .ok_or_else(|| Error::Dom("profile card not initialized".into()))?
        .update_time()?;
    page.assert_text(TIME, "1700000001500")?;
    page.assert_attr(TIME, "datetime", Some("2023-11-14T22:13:21.500Z"))?;
    Ok(())
}

#[test]
fn run_next_timer_jumps_to_the_next_tick() -> Result<()> {
    let mut page = profile_page(0)?;
    assert!(page.run_next_timer()?);
    page.assert_text(TIME, "1000")?;
    assert_eq!(page.run_due_timers()?, 0);
    page.advance_time_to(3000)?;
    page.assert_text(TIME, "3000")?;
    Ok(())
}

#[test]
fn accessibility_attributes_are_added_once() -> Result<()> {
    let page = profile_page(ORIGIN)?;
    page.assert_attr(CARD, "role", Some("article"))?;
    page.assert_attr(TIME, "aria-live", Some("polite"))?;
    page.assert_attr(TIME, "aria-atomic", Some("true"))?;
    page.assert_attr(
        "[data-testid='test-user-social-github']",
        "aria-label",
        Some("Visit GitHub profile"),
    )?;
    page.assert_attr(
        "[data-testid='test-user-social-twitter']",
        "aria-label",
        Some("Visit Twitter profile"),
    )?;
    page.assert_attr(
        "[data-testid='test-user-social-linkedin']",
        "aria-label",
        Some("LinkedIn page"),
    )?;
    page.assert_attr("[data-testid='test-user-social-links']", "aria-label", None)?;
    Ok(())
}

#[test]
fn broken_avatar_falls_back_without_looping() -> Result<()> {
    let mut page = profile_page(ORIGIN)?;
    page.take_console_logs();

    page.fail_image(AVATAR)?;
    page.assert_attr(AVATAR, "src", Some(FALLBACK))?;

    page.fail_image(AVATAR)?;
    page.assert_attr(AVATAR, "src", Some(FALLBACK))?;

    let logs = page.take_console_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, ConsoleLevel::Warn);
    assert_eq!(logs[0].message, "Avatar image failed to load, using fallback");

    page.load_image(AVATAR)?;
    page.assert_attr(AVATAR, "style", Some("opacity: 1;"))?;
    Ok(())
}

#[test]
fn error_on_the_card_leaves_the_avatar_alone() -> Result<()> {
    let mut page = profile_page(ORIGIN)?;
    let outcome = page.dispatch(CARD, "error")?;
    assert!(!outcome.default_prevented);
    page.assert_attr(AVATAR, "src", Some("avatar.jpg"))?;
    Ok(())
}

#[test]
fn missing_test_ids_produce_one_warning() -> Result<()> {
    init_tracing();
    let mut page = Page::from_html(
        r#"<div data-testid="test-profile-card">
             <time data-testid="test-user-time"></time>
           </div>"#,
    )?;
    page.attach_profile_card(ProfileCardConfig::default())?;
    page.finish_loading()?;

    let warnings = page
        .console_logs()
        .into_iter()
        .filter(|entry| entry.level == ConsoleLevel::Warn)
        .map(|entry| entry.message)
        .collect::<Vec<_>>();
    assert_eq!(
        warnings,
        vec![
            "Missing test IDs: test-user-name, test-user-bio, test-user-avatar, test-user-social-links, test-user-hobbies, test-user-dislikes"
                .to_string()
        ]
    );
    page.assert_text(TIME, "0")?;
    Ok(())
}

#[test]
fn custom_config_changes_tick_and_fallback() -> Result<()> {
    init_tracing();
    let mut config = ProfileCardConfig::default();
    config.set_tick_interval_ms(250)?;
    config.set_avatar_fallback_src("/img/default.png")?;
    config.set_required_test_ids(["test-profile-card"]);

    let mut page = Page::from_html(PROFILE_HTML)?;
    page.attach_profile_card(config)?;
    page.finish_loading()?;

    page.advance_time(500)?;
    page.assert_text(TIME, "500")?;
    page.fail_image(AVATAR)?;
    page.assert_attr(AVATAR, "src", Some("/img/default.png"))?;
    assert!(console_messages(&page).contains(&"All required test IDs are present".to_string()));
    Ok(())
}

#[test]
fn hand_built_elements_only_touch_what_they_name() -> Result<()> {
    init_tracing();
    let mut page = Page::from_html(PROFILE_HTML)?;
    let elements = ProfileCardElements {
        time: Some(page.select(TIME)?),
        ..ProfileCardElements::default()
    };
    page.attach_profile_card_with(ProfileCardConfig::default(), elements)?;
    page.finish_loading()?;

    page.assert_text(TIME, "0")?;
    page.assert_attr(CARD, "role", None)?;
    page.fail_image(AVATAR)?;
    page.assert_attr(AVATAR, "src", Some("avatar.jpg"))?;
    Ok(())
}

#[test]
fn unload_stops_the_clock() -> Result<()> {
    let mut page = profile_page(ORIGIN)?;
    page.advance_time(1000)?;
    page.unload();

    assert_eq!(page.ready_state(), ReadyState::Unloaded);
    assert!(page.pending_timers().is_empty());
    assert!(page.profile_card().is_none());

    page.advance_time(5000)?;
    page.assert_text(TIME, "1700000001000")?;
    page.flush()?;
    Ok(())
}

#[test]
fn both_controllers_share_one_page_independently() -> Result<()> {
    init_tracing();
    let html = format!("{CONTACT_HTML}{PROFILE_HTML}");
    let mut page = Page::from_html_with_config(&html, PageConfig::default())?;
    page.attach_contact_form(ContactFormConfig::default())?;
    page.attach_profile_card(ProfileCardConfig::default())?;
    page.finish_loading()?;

    fill_valid(&mut page)?;
    page.click(SUBMIT)?;
    assert_eq!(page.pending_timers().len(), 2);

    page.advance_time(1000)?;
    page.assert_text(TIME, "1000")?;
    page.assert_value(NAME, "")?;
    page.assert_focused(BANNER)?;

    page.advance_time(5000)?;
    page.assert_class(BANNER, "hidden", true)?;
    page.assert_text(TIME, "6000")?;
    Ok(())
}

#[test]
fn flush_with_a_live_clock_hits_the_step_limit() -> Result<()> {
    let mut page = profile_page(0)?;
    page.set_timer_step_limit(3)?;
    assert!(matches!(page.flush(), Err(Error::Timer(_))));
    page.assert_text(TIME, "3000")?;
    Ok(())
}
