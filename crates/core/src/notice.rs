//! Inline messages shown in place of a widget's content

use serde::Serialize;

/// What kind of message a notice carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// "Loading..." placeholder while a request is in flight
    Loading,
    /// Validation problem; the operation was aborted
    Warning,
    /// Informational note shown above a chart
    Note,
    /// Server-reported or data error
    Error,
}

/// Inline message replacing (or prefixing) a widget's content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    /// Id of the widget the message is shown in
    pub target: String,
    pub kind: NoticeKind,
    pub text: String,
    /// Line height used to center the text vertically, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    /// Whether a spinner is shown next to the text
    pub loader: bool,
}

impl Notice {
    /// Loading placeholder sized to the content area
    pub fn loading(target: impl Into<String>, content_height: f64) -> Self {
        Self {
            target: target.into(),
            kind: NoticeKind::Loading,
            text: "Loading...".to_string(),
            line_height: placeholder_line_height(content_height),
            loader: true,
        }
    }

    pub fn warning(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: NoticeKind::Warning,
            text: text.into(),
            line_height: None,
            loader: false,
        }
    }

    pub fn note(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: NoticeKind::Note,
            text: text.into(),
            line_height: None,
            loader: false,
        }
    }

    /// Centered message sized to the content area
    pub fn error(target: impl Into<String>, text: impl Into<String>, content_height: f64) -> Self {
        Self {
            target: target.into(),
            kind: NoticeKind::Error,
            text: text.into(),
            line_height: placeholder_line_height(content_height),
            loader: false,
        }
    }
}

/// Line height for a centered placeholder in an area `height` pixels tall.
///
/// Small areas get a fixed 180px, large ones are capped at 400px. A zero
/// height means "don't center".
pub fn placeholder_line_height(height: f64) -> Option<f64> {
    if height <= 0.0 {
        return None;
    }
    let h = height - 32.0;
    Some(if h < 80.0 {
        180.0
    } else if h > 400.0 {
        400.0
    } else {
        h
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_line_height() {
        assert_eq!(placeholder_line_height(0.0), None);
        assert_eq!(placeholder_line_height(100.0), Some(180.0));
        assert_eq!(placeholder_line_height(332.0), Some(300.0));
        assert_eq!(placeholder_line_height(1000.0), Some(400.0));
    }

    #[test]
    fn test_loading_notice() {
        let notice = Notice::loading("plotgrid", 500.0);
        assert_eq!(notice.kind, NoticeKind::Loading);
        assert_eq!(notice.text, "Loading...");
        assert!(notice.loader);
        assert_eq!(notice.line_height, Some(400.0));
    }
}
