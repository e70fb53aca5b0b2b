#![allow(dead_code)]

use pagekit::{ContactFormConfig, Page, PageConfig, ProfileCardConfig, Result};
use tracing_subscriber::EnvFilter;

pub const NAME: &str = "[data-testid='test-contact-name']";
pub const EMAIL: &str = "[data-testid='test-contact-email']";
pub const SUBJECT: &str = "[data-testid='test-contact-subject']";
pub const MESSAGE: &str = "[data-testid='test-contact-message']";
pub const SUBMIT: &str = "[data-testid='test-contact-submit']";
pub const NAME_ERROR: &str = "[data-testid='test-contact-error-name']";
pub const EMAIL_ERROR: &str = "[data-testid='test-contact-error-email']";
pub const SUBJECT_ERROR: &str = "[data-testid='test-contact-error-subject']";
pub const MESSAGE_ERROR: &str = "[data-testid='test-contact-error-message']";
pub const BANNER: &str = "#success-message";
pub const BUTTON_LABEL: &str = "[data-testid='test-contact-submit'] .button-text";

pub const TIME: &str = "[data-testid='test-user-time']";
pub const AVATAR: &str = "[data-testid='test-user-avatar']";
pub const CARD: &str = "[data-testid='test-profile-card']";

pub const CONTACT_HTML: &str = r#"
<main class="contact-page">
  <h1>Contact Us</h1>
  <form id="contactForm" novalidate>
    <div class="form-group">
      <label for="name">Full Name</label>
      <input type="text" id="name" name="name" data-testid="test-contact-name" aria-describedby="name-error">
      <span id="name-error" class="error-message" data-testid="test-contact-error-name" role="alert"></span>
    </div>
    <div class="form-group">
      <label for="email">Email</label>
      <input type="email" id="email" name="email" data-testid="test-contact-email" aria-describedby="email-error">
      <span id="email-error" class="error-message" data-testid="test-contact-error-email" role="alert"></span>
    </div>
    <div class="form-group">
      <label for="subject">Subject</label>
      <input type="text" id="subject" name="subject" data-testid="test-contact-subject" aria-describedby="subject-error">
      <span id="subject-error" class="error-message" data-testid="test-contact-error-subject" role="alert"></span>
    </div>
    <div class="form-group">
      <label for="message">Message</label>
      <textarea id="message" name="message" rows="5" data-testid="test-contact-message" aria-describedby="message-error"></textarea>
      <span id="message-error" class="error-message" data-testid="test-contact-error-message" role="alert"></span>
    </div>
    <button type="submit" class="submit-btn" data-testid="test-contact-submit">
      <span class="button-text">Send Message</span>
    </button>
  </form>
  <div id="success-message" class="success-message hidden" data-testid="test-contact-success" role="status">
    Thank you! Your message has been sent.
  </div>
</main>
"#;

pub const PROFILE_HTML: &str = r#"
<article class="profile-card" data-testid="test-profile-card">
  <img src="avatar.jpg" alt="Profile picture" class="avatar" data-testid="test-user-avatar">
  <h1 data-testid="test-user-name">Jane Doe</h1>
  <p data-testid="test-user-bio">Frontend developer who likes small, sharp tools.</p>
  <p>Current time: <time data-testid="test-user-time"></time></p>
  <nav>
    <ul data-testid="test-user-social-links">
      <li><a href="https://github.com" data-testid="test-user-social-github" target="_blank">GitHub</a></li>
      <li><a href="https://twitter.com" data-testid="test-user-social-twitter" target="_blank">
        Twitter
      </a></li>
      <li><a href="https://linkedin.com" data-testid="test-user-social-linkedin" aria-label="LinkedIn page">LinkedIn</a></li>
    </ul>
  </nav>
  <section><h2>Hobbies</h2><ul data-testid="test-user-hobbies"><li>Chess</li></ul></section>
  <section><h2>Dislikes</h2><ul data-testid="test-user-dislikes"><li>Flaky tests</li></ul></section>
</article>
"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn contact_page() -> Result<Page> {
    init_tracing();
    let mut page = Page::from_html(CONTACT_HTML)?;
    page.attach_contact_form(ContactFormConfig::default())?;
    page.finish_loading()?;
    Ok(page)
}

pub fn profile_page(clock_origin_ms: i64) -> Result<Page> {
    init_tracing();
    let mut config = PageConfig::default();
    config.set_clock_origin_ms(clock_origin_ms)?;
    let mut page = Page::from_html_with_config(PROFILE_HTML, config)?;
    page.attach_profile_card(ProfileCardConfig::default())?;
    page.finish_loading()?;
    Ok(page)
}

pub fn fill_valid(page: &mut Page) -> Result<()> {
    page.type_text(NAME, "Jo")?;
    page.type_text(EMAIL, "a@b.co")?;
    page.type_text(SUBJECT, "Hi!")?;
    page.type_text(MESSAGE, "1234567890")
}

pub fn console_messages(page: &Page) -> Vec<String> {
    page.console_logs()
        .into_iter()
        .map(|entry| entry.message)
        .collect()
}
