//! Editable dashboard inputs and the rules derived from them
//!
//! The send action's enabled state is never stored: [`send_enabled`] is
//! recomputed from the draft and the session every time it is needed.

use crate::error::ValidationError;

pub const DEFAULT_DELAY_MIN: i64 = 30;
pub const DEFAULT_DELAY_MAX: i64 = 60;

/// Delay bounds, in seconds, the backend waits between two recipients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: i64,
    pub max: i64,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_DELAY_MIN,
            max: DEFAULT_DELAY_MAX,
        }
    }
}

impl DelayRange {
    /// Parse the two text fields, falling back per bound when a field is
    /// blank, unparseable, or zero.
    pub fn parse(min: &str, max: &str) -> Self {
        Self {
            min: parse_leading_int(min).unwrap_or(DEFAULT_DELAY_MIN),
            max: parse_leading_int(max).unwrap_or(DEFAULT_DELAY_MAX),
        }
    }

    pub fn as_pair(&self) -> [i64; 2] {
        [self.min, self.max]
    }
}

/// Leading-integer parse ("45s" -> 45). Zero counts as unset.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .ok()
        .map(|value| value * sign)
        .filter(|value| *value != 0)
}

/// Split the usernames text into one entry per non-blank line, keeping order
/// and duplicates.
pub fn parse_usernames(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn send_enabled(has_usernames: bool, has_message: bool, logged_in: bool) -> bool {
    has_usernames && has_message && logged_in
}

/// A validated send waiting for the user's yes/no
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub request: SendRequest,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub usernames: Vec<String>,
    pub message: String,
    pub delay_range: DelayRange,
}

impl SendRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.usernames.is_empty() {
            return Err(ValidationError::NoUsernames);
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(())
    }

    pub fn confirmation_prompt(&self) -> String {
        format!(
            "Are you sure you want to send this message to {} users?\n\nMessage: \"{}\"",
            self.usernames.len(),
            self.message
        )
    }
}

/// Text the user is typing into the dashboard and login form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftForm {
    pub login_username: String,
    pub login_password: String,
    pub usernames_text: String,
    pub message: String,
    pub delay_min: String,
    pub delay_max: String,
}

impl DraftForm {
    pub fn usernames(&self) -> Vec<String> {
        parse_usernames(&self.usernames_text)
    }

    pub fn has_usernames(&self) -> bool {
        self.usernames_text.lines().any(|line| !line.trim().is_empty())
    }

    pub fn has_message(&self) -> bool {
        !self.message.trim().is_empty()
    }

    /// Character counter shown under the message editor
    pub fn message_chars(&self) -> usize {
        self.message.chars().count()
    }

    pub fn can_send(&self, logged_in: bool) -> bool {
        send_enabled(self.has_usernames(), self.has_message(), logged_in)
    }

    pub fn delay_range(&self) -> DelayRange {
        DelayRange::parse(&self.delay_min, &self.delay_max)
    }

    /// Validate the draft and build the request plus its confirmation text.
    pub fn prepare_send(&self) -> Result<PendingSend, ValidationError> {
        let request = SendRequest {
            usernames: self.usernames(),
            message: self.message.trim().to_string(),
            delay_range: self.delay_range(),
        };
        request.validate()?;
        let prompt = request.confirmation_prompt();
        Ok(PendingSend { request, prompt })
    }

    /// Clear the per-campaign inputs. Delay fields are a standing preference
    /// and survive logout.
    pub fn reset_dashboard(&mut self) {
        self.usernames_text.clear();
        self.message.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_enabled_is_conjunction_for_all_combinations() {
        for has_usernames in [false, true] {
            for has_message in [false, true] {
                for logged_in in [false, true] {
                    assert_eq!(
                        send_enabled(has_usernames, has_message, logged_in),
                        has_usernames && has_message && logged_in,
                        "usernames={has_usernames} message={has_message} logged_in={logged_in}"
                    );
                }
            }
        }
    }

    #[test]
    fn draft_can_send_tracks_every_edit() {
        let mut draft = DraftForm::default();
        assert!(!draft.can_send(true));

        draft.usernames_text = "alice\n".into();
        assert!(!draft.can_send(true));

        draft.message = "   ".into();
        assert!(!draft.can_send(true));

        draft.message = "Hello!".into();
        assert!(draft.can_send(true));
        assert!(!draft.can_send(false));

        draft.usernames_text = " \n\n ".into();
        assert!(!draft.can_send(true));
    }

    #[test]
    fn usernames_skip_blank_lines_and_keep_duplicates() {
        let parsed = parse_usernames("  alice \n\n bob\nalice\n   \n");
        assert_eq!(parsed, vec!["alice", "bob", "alice"]);
    }

    #[test]
    fn blank_delay_fields_default_to_thirty_sixty() {
        let draft = DraftForm::default();
        assert_eq!(draft.delay_range(), DelayRange { min: 30, max: 60 });
    }

    #[test]
    fn delay_parse_takes_leading_integer_and_treats_zero_as_unset() {
        assert_eq!(DelayRange::parse("45s", " 90"), DelayRange { min: 45, max: 90 });
        assert_eq!(DelayRange::parse("0", "abc"), DelayRange { min: 30, max: 60 });
        assert_eq!(DelayRange::parse("-5", "+12"), DelayRange { min: -5, max: 12 });
    }

    #[test]
    fn prepare_send_validates_before_anything_else() {
        let mut draft = DraftForm::default();
        assert_eq!(draft.prepare_send(), Err(ValidationError::NoUsernames));

        draft.usernames_text = "alice\nbob".into();
        assert_eq!(draft.prepare_send(), Err(ValidationError::EmptyMessage));
    }

    #[test]
    fn prepare_send_builds_prompt_with_count_and_message() {
        let draft = DraftForm {
            usernames_text: "alice\nbob\ncarol".into(),
            message: " Big sale today ".into(),
            delay_min: "10".into(),
            ..DraftForm::default()
        };

        let pending = draft.prepare_send().expect("valid draft");

        assert_eq!(pending.request.usernames, vec!["alice", "bob", "carol"]);
        assert_eq!(pending.request.message, "Big sale today");
        assert_eq!(pending.request.delay_range, DelayRange { min: 10, max: 60 });
        assert_eq!(
            pending.prompt,
            "Are you sure you want to send this message to 3 users?\n\nMessage: \"Big sale today\""
        );
    }

    #[test]
    fn reset_dashboard_keeps_login_and_delay_fields() {
        let mut draft = DraftForm {
            login_username: "brand".into(),
            usernames_text: "alice".into(),
            message: "hi".into(),
            delay_min: "5".into(),
            delay_max: "9".into(),
            ..DraftForm::default()
        };
        draft.reset_dashboard();
        assert_eq!(draft.login_username, "brand");
        assert!(draft.usernames_text.is_empty());
        assert!(draft.message.is_empty());
        assert_eq!(draft.message_chars(), 0);
        assert_eq!(draft.delay_range(), DelayRange { min: 5, max: 9 });
    }
}
