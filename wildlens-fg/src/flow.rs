//! Session state machine
//!
//! Models the identification flow as explicit states and events: which page
//! is showing, where the current upload is in its lifecycle, the latest
//! identification outcome, and the transient save notice. Transitions are
//! pure (`apply` consumes the session and returns the next one) so the whole
//! flow is testable without I/O.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use wildlens_common::api::Candidate;

/// How long the save notice stays visible
pub const SAVE_NOTICE_SECONDS: i64 = 3;

/// Notice text after a successful save
pub const SAVED_MESSAGE: &str = "Species saved successfully!";

/// Top-level page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Landing,
    Upload,
    Results,
    Collection,
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Page::Landing => write!(f, "landing"),
            Page::Upload => write!(f, "upload"),
            Page::Results => write!(f, "results"),
            Page::Collection => write!(f, "collection"),
        }
    }
}

/// Upload lifecycle on the upload page
///
/// `preview` is an opaque display string for the chosen image (a data URL or
/// a file path label); the state machine never inspects it.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    /// No image chosen yet
    Idle,
    /// Image chosen and previewed, ready to submit
    Capturing { preview: String },
    /// Submission in flight; further submissions are ignored
    Analyzing { preview: String },
    /// Submission failed; preview kept for display alongside the message
    Failed { preview: String, message: String },
}

/// Everything known about a completed identification
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    /// Ranked candidates, best first (may be empty)
    pub candidates: Vec<Candidate>,
    /// Token naming the identification on the remote service
    pub access_token: String,
    /// The image that was analyzed, kept for saving to the collection
    pub uploaded_image: String,
}

/// Transient notice with its display start time
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

/// Events driving the session
#[derive(Debug, Clone)]
pub enum Event {
    /// Leave the landing page for the upload page
    Start,
    /// Navigate to the landing page
    GoHome,
    /// Navigate to the collection page
    OpenCollection,
    /// An image was chosen and its preview prepared
    PreviewReady { preview: String },
    /// Submit the previewed image for analysis
    BeginAnalysis,
    /// Analysis finished with ranked candidates
    AnalysisSucceeded {
        candidates: Vec<Candidate>,
        access_token: String,
    },
    /// Analysis failed with a display message
    AnalysisFailed { message: String },
    /// Dismiss a failure; the preview is discarded and a new image
    /// must be chosen
    Retry,
    /// Leave the results page back to a fresh upload page
    BackToUpload,
    /// A species was saved to the collection
    SpeciesSaved,
}

/// One user session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub page: Page,
    pub upload: UploadState,
    pub outcome: Option<Identification>,
    pub notice: Option<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            page: Page::Landing,
            upload: UploadState::Idle,
            outcome: None,
            notice: None,
        }
    }

    /// True when an image is previewed and submission is allowed
    pub fn can_submit(&self) -> bool {
        matches!(self.upload, UploadState::Capturing { .. })
    }

    /// The save notice, if still within its display window
    pub fn notice_visible(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.notice.as_ref().filter(|notice| {
            now.signed_duration_since(notice.shown_at) < Duration::seconds(SAVE_NOTICE_SECONDS)
        })
    }

    /// Apply one event, returning the next session state.
    ///
    /// Events that do not fit the current state are ignored; in particular a
    /// second submission while one is in flight, and analysis outcomes
    /// arriving when nothing is in flight.
    pub fn apply(self, event: Event, now: DateTime<Utc>) -> Session {
        let Session {
            page,
            upload,
            outcome,
            notice,
        } = self;

        match event {
            Event::Start => Session {
                page: Page::Upload,
                upload: UploadState::Idle,
                outcome,
                notice,
            },

            Event::GoHome => Session {
                page: Page::Landing,
                upload: UploadState::Idle,
                outcome,
                notice,
            },

            Event::OpenCollection => Session {
                page: Page::Collection,
                upload: UploadState::Idle,
                outcome,
                notice,
            },

            Event::PreviewReady { preview } => {
                // Choosing a new image replaces any previous preview or
                // failure, but never interrupts an in-flight analysis and
                // means nothing off the upload page
                let upload = match (page, upload) {
                    (Page::Upload, current @ UploadState::Analyzing { .. }) => current,
                    (Page::Upload, _) => UploadState::Capturing { preview },
                    (_, current) => current,
                };
                Session {
                    page,
                    upload,
                    outcome,
                    notice,
                }
            }

            Event::BeginAnalysis => {
                let upload = match upload {
                    UploadState::Capturing { preview } => UploadState::Analyzing { preview },
                    other => other,
                };
                Session {
                    page,
                    upload,
                    outcome,
                    notice,
                }
            }

            Event::AnalysisSucceeded {
                candidates,
                access_token,
            } => match upload {
                UploadState::Analyzing { preview } => Session {
                    page: Page::Results,
                    upload: UploadState::Idle,
                    outcome: Some(Identification {
                        candidates,
                        access_token,
                        uploaded_image: preview,
                    }),
                    notice,
                },
                upload => Session {
                    page,
                    upload,
                    outcome,
                    notice,
                },
            },

            Event::AnalysisFailed { message } => {
                let upload = match upload {
                    UploadState::Analyzing { preview } => UploadState::Failed { preview, message },
                    other => other,
                };
                Session {
                    page,
                    upload,
                    outcome,
                    notice,
                }
            }

            Event::Retry => {
                let upload = match upload {
                    UploadState::Failed { .. } => UploadState::Idle,
                    other => other,
                };
                Session {
                    page,
                    upload,
                    outcome,
                    notice,
                }
            }

            Event::BackToUpload => match page {
                Page::Results => Session {
                    page: Page::Upload,
                    upload: UploadState::Idle,
                    outcome: None,
                    notice,
                },
                page => Session {
                    page,
                    upload,
                    outcome,
                    notice,
                },
            },

            Event::SpeciesSaved => Session {
                page,
                upload,
                outcome,
                notice: Some(Notice {
                    message: SAVED_MESSAGE.to_string(),
                    shown_at: now,
                }),
            },
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn candidate(name: &str) -> Candidate {
        Candidate {
            id: "c-1".to_string(),
            name: name.to_string(),
            common_names: vec![],
            probability: 0.9,
            description: None,
            url: None,
            image: None,
            images: vec![],
        }
    }

    #[test]
    fn test_new_session_starts_on_landing() {
        let session = Session::new();
        assert_eq!(session.page, Page::Landing);
        assert_eq!(session.upload, UploadState::Idle);
        assert!(session.outcome.is_none());
        assert!(!session.can_submit());
    }

    #[test]
    fn test_happy_path_to_results() {
        let session = Session::new()
            .apply(Event::Start, t0())
            .apply(
                Event::PreviewReady {
                    preview: "photo-1".to_string(),
                },
                t0(),
            )
            .apply(Event::BeginAnalysis, t0())
            .apply(
                Event::AnalysisSucceeded {
                    candidates: vec![candidate("Papilio polytes")],
                    access_token: "tok-1".to_string(),
                },
                t0(),
            );

        assert_eq!(session.page, Page::Results);
        assert_eq!(session.upload, UploadState::Idle);

        let outcome = session.outcome.unwrap();
        assert_eq!(outcome.access_token, "tok-1");
        assert_eq!(outcome.uploaded_image, "photo-1");
        assert_eq!(outcome.candidates[0].name, "Papilio polytes");
    }

    #[test]
    fn test_can_submit_only_while_capturing() {
        let session = Session::new().apply(Event::Start, t0());
        assert!(!session.can_submit());

        let session = session.apply(
            Event::PreviewReady {
                preview: "p".to_string(),
            },
            t0(),
        );
        assert!(session.can_submit());

        let session = session.apply(Event::BeginAnalysis, t0());
        assert!(!session.can_submit());
    }

    #[test]
    fn test_second_submission_while_in_flight_is_ignored() {
        let session = Session::new()
            .apply(Event::Start, t0())
            .apply(
                Event::PreviewReady {
                    preview: "p".to_string(),
                },
                t0(),
            )
            .apply(Event::BeginAnalysis, t0());

        let again = session.clone().apply(Event::BeginAnalysis, t0());
        assert_eq!(again, session);
    }

    #[test]
    fn test_new_preview_ignored_while_analyzing() {
        let session = Session::new()
            .apply(Event::Start, t0())
            .apply(
                Event::PreviewReady {
                    preview: "first".to_string(),
                },
                t0(),
            )
            .apply(Event::BeginAnalysis, t0())
            .apply(
                Event::PreviewReady {
                    preview: "second".to_string(),
                },
                t0(),
            );

        assert_eq!(
            session.upload,
            UploadState::Analyzing {
                preview: "first".to_string()
            }
        );
    }

    #[test]
    fn test_new_preview_replaces_previous_one() {
        let session = Session::new()
            .apply(Event::Start, t0())
            .apply(
                Event::PreviewReady {
                    preview: "first".to_string(),
                },
                t0(),
            )
            .apply(
                Event::PreviewReady {
                    preview: "second".to_string(),
                },
                t0(),
            );

        assert_eq!(
            session.upload,
            UploadState::Capturing {
                preview: "second".to_string()
            }
        );
    }

    #[test]
    fn test_failure_keeps_preview_and_retry_discards_it() {
        let session = Session::new()
            .apply(Event::Start, t0())
            .apply(
                Event::PreviewReady {
                    preview: "p".to_string(),
                },
                t0(),
            )
            .apply(Event::BeginAnalysis, t0())
            .apply(
                Event::AnalysisFailed {
                    message: "Upload failed: Forbidden".to_string(),
                },
                t0(),
            );

        assert_eq!(session.page, Page::Upload);
        assert_eq!(
            session.upload,
            UploadState::Failed {
                preview: "p".to_string(),
                message: "Upload failed: Forbidden".to_string()
            }
        );

        // Retry returns to idle; a new image must be chosen
        let session = session.apply(Event::Retry, t0());
        assert_eq!(session.upload, UploadState::Idle);
        assert!(!session.can_submit());
    }

    #[test]
    fn test_analysis_outcome_ignored_when_nothing_in_flight() {
        let idle = Session::new().apply(Event::Start, t0());

        let after = idle.clone().apply(
            Event::AnalysisSucceeded {
                candidates: vec![candidate("X")],
                access_token: "tok".to_string(),
            },
            t0(),
        );
        assert_eq!(after, idle);

        let after = idle.clone().apply(
            Event::AnalysisFailed {
                message: "boom".to_string(),
            },
            t0(),
        );
        assert_eq!(after, idle);
    }

    #[test]
    fn test_back_to_upload_clears_outcome() {
        let session = Session::new()
            .apply(Event::Start, t0())
            .apply(
                Event::PreviewReady {
                    preview: "p".to_string(),
                },
                t0(),
            )
            .apply(Event::BeginAnalysis, t0())
            .apply(
                Event::AnalysisSucceeded {
                    candidates: vec![],
                    access_token: "tok".to_string(),
                },
                t0(),
            )
            .apply(Event::BackToUpload, t0());

        assert_eq!(session.page, Page::Upload);
        assert!(session.outcome.is_none());
        assert_eq!(session.upload, UploadState::Idle);
    }

    #[test]
    fn test_navigating_away_resets_upload() {
        let session = Session::new()
            .apply(Event::Start, t0())
            .apply(
                Event::PreviewReady {
                    preview: "p".to_string(),
                },
                t0(),
            )
            .apply(Event::GoHome, t0());

        assert_eq!(session.page, Page::Landing);
        assert_eq!(session.upload, UploadState::Idle);
    }

    #[test]
    fn test_save_notice_expires_after_three_seconds() {
        let session = Session::new().apply(Event::SpeciesSaved, t0());

        let visible = session.notice_visible(t0() + Duration::milliseconds(2900));
        assert_eq!(visible.map(|n| n.message.as_str()), Some(SAVED_MESSAGE));

        assert!(session
            .notice_visible(t0() + Duration::milliseconds(3100))
            .is_none());
    }

    #[test]
    fn test_preview_ignored_outside_upload_page() {
        let session = Session::new().apply(
            Event::PreviewReady {
                preview: "p".to_string(),
            },
            t0(),
        );

        assert_eq!(session.page, Page::Landing);
        assert_eq!(session.upload, UploadState::Idle);
    }

    #[test]
    fn test_page_display_names() {
        assert_eq!(Page::Landing.to_string(), "landing");
        assert_eq!(Page::Collection.to_string(), "collection");
    }
}
