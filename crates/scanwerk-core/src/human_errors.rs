// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error classification for the frame pipeline, plus plain-language messages
// for the scan screen.
//
// The pipeline only needs one decision per error: skip this frame and keep
// going, or stop. Everything the camera preview can recover from on the next
// frame is `Recoverable`; only allocation failure is `Fatal`.

use crate::error::ScanwerkError;
use crate::types::ErrorClass;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A single frame failed; the next frame is a fresh attempt.
    Transient,
    /// User must do something (grant camera access, fix a config file).
    ActionRequired,
    /// Scanning cannot continue in this session.
    Fatal,
}

/// A human-readable error with plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the pipeline carries on by itself.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Decide whether the frame pipeline may continue after `err`.
pub fn classify_error(err: &ScanwerkError) -> ErrorClass {
    match err {
        ScanwerkError::Detection(_)
        | ScanwerkError::Geometry(_)
        | ScanwerkError::Resource(_)
        | ScanwerkError::Timeout(_) => ErrorClass::Recoverable,

        // Cancellation is how a session ends, not a failure of the frame.
        ScanwerkError::Cancelled => ErrorClass::Recoverable,

        ScanwerkError::OutOfMemory(_) => ErrorClass::Fatal,

        ScanwerkError::Config(_)
        | ScanwerkError::Serialization(_)
        | ScanwerkError::Bridge(_)
        | ScanwerkError::PlatformUnavailable => ErrorClass::Fatal,

        ScanwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::OutOfMemory => ErrorClass::Fatal,
            _ => ErrorClass::Recoverable,
        },
    }
}

/// Convert a `ScanwerkError` into a `HumanError` for the scan screen.
pub fn humanize_error(err: &ScanwerkError) -> HumanError {
    match err {
        ScanwerkError::Detection(_) | ScanwerkError::Geometry(_) => HumanError {
            message: "We can't see the edges of the page yet.".into(),
            suggestion: "Place the document on a contrasting surface and keep all four corners in view.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::Resource(_) => HumanError {
            message: "A camera frame couldn't be read.".into(),
            suggestion: "Hold on, the next frame will be tried automatically.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::Timeout(_) => HumanError {
            message: "Edge detection is running slowly.".into(),
            suggestion: "Close other apps that use the camera or processor heavily.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::Cancelled => HumanError {
            message: "Scanning stopped.".into(),
            suggestion: "Open the camera again to continue scanning.".into(),
            retriable: false,
            severity: Severity::Transient,
        },

        ScanwerkError::OutOfMemory(_) => HumanError {
            message: "Your device ran out of memory while scanning.".into(),
            suggestion: "Close other apps and open the scanner again.".into(),
            retriable: false,
            severity: Severity::Fatal,
        },

        ScanwerkError::Config(detail) => HumanError {
            message: "The scanner settings are invalid.".into(),
            suggestion: format!("Reset the scanner settings to their defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The image couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing it again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to read that image.".into(),
                    suggestion: "Check the file permissions, or copy the image somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        ScanwerkError::Serialization(_) => HumanError {
            message: "The scanner settings file is damaged.".into(),
            suggestion: "Delete the settings file; defaults will be used.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::Bridge(_) => HumanError {
            message: "The camera didn't respond.".into(),
            suggestion: "Try closing and reopening the scanner.".into(),
            retriable: false,
            severity: Severity::Fatal,
        },

        ScanwerkError::PlatformUnavailable => HumanError {
            message: "Live scanning isn't available on this device.".into(),
            suggestion: "You can still import photos of documents from your files.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
