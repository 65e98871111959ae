use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::{self, authentication},
    Message, SmtpTransport, Transport,
};

use std::{ffi::OsStr, fmt::Debug, fs, io, path::Path};

use crate::error::PipelineError;

const SUBJECT: &str = "Your Sales Analysis Report is Ready!";

const BODY: &str = "Hello,\n\n\
    Attached to this email is the sales analysis report you requested.\n\n\
    It contains the key insights extracted from the data, along with a chart \
    to make them easier to digest.\n\n\
    Best regards,\n\
    relatorio - your sales analysis assistant";

/// Sender credentials for the mail relay. Opaque to the delivery agent;
/// collecting them (prompting, env) is the caller's concern.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    app_password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: String, app_password: String) -> Self {
        Self { email, app_password }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

/// Emails the composed report at `report` to `recipient` through `relay`.
///
/// The connection starts in plaintext on the submission port and upgrades
/// via STARTTLS before authenticating. One attempt only; nothing is retried
/// or queued.
///
/// # Errors
///
/// Returns [`PipelineError::AttachmentNotFound`] if the report file is
/// absent (checked before any network activity),
/// [`PipelineError::AuthenticationFailure`] when the relay rejects the
/// credentials, and [`PipelineError::DeliveryFailure`] for any other
/// transport or address error.
pub fn send_report(
    credentials: &Credentials,
    recipient: &str,
    report: impl AsRef<Path>,
    relay: &str,
) -> Result<(), PipelineError> {
    let report = report.as_ref();
    if !report.is_file() {
        return Err(PipelineError::AttachmentNotFound(
            report.display().to_string(),
        ));
    }
    let pdf_bytes = fs::read(report).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            PipelineError::AttachmentNotFound(report.display().to_string())
        }
        _ => PipelineError::DeliveryFailure(e.to_string()),
    })?;
    let filename = report
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("report.pdf")
        .to_string();
    let message = build_message(credentials.email(), recipient, filename, pdf_bytes)?;

    let mailer = SmtpTransport::starttls_relay(relay)
        .map_err(|e| PipelineError::DeliveryFailure(e.to_string()))?
        .credentials(authentication::Credentials::new(
            credentials.email.clone(),
            credentials.app_password.clone(),
        ))
        .build();
    mailer.send(&message).map_err(classify_send_error)?;
    Ok(())
}

fn build_message(
    from: &str,
    to: &str,
    filename: String,
    pdf_bytes: Vec<u8>,
) -> Result<Message, PipelineError> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| PipelineError::DeliveryFailure(format!("invalid sender address: {e}")))?;
    let to: Mailbox = to
        .parse()
        .map_err(|e| PipelineError::DeliveryFailure(format!("invalid recipient address: {e}")))?;
    let pdf_type = ContentType::parse("application/pdf")
        .map_err(|e| PipelineError::DeliveryFailure(e.to_string()))?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(Attachment::new(filename).body(pdf_bytes, pdf_type)),
        )
        .map_err(|e| PipelineError::DeliveryFailure(e.to_string()))
}

fn classify_send_error(err: smtp::Error) -> PipelineError {
    let code = err.status().map(|code| code.to_string());
    if is_auth_rejection(err.is_permanent(), code.as_deref()) {
        PipelineError::AuthenticationFailure(err.to_string())
    } else {
        PipelineError::DeliveryFailure(err.to_string())
    }
}

/// Permanent replies in the SMTP authentication category (53x, e.g. 535 bad
/// credentials) are credential rejections; everything else is a transport
/// failure.
fn is_auth_rejection(permanent: bool, code: Option<&str>) -> bool {
    permanent && code.is_some_and(|code| code.starts_with("53"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> Credentials {
        Credentials::new("sender@example.com".to_string(), "hunter2".to_string())
    }

    #[test]
    fn send_report_fn_signals_attachment_not_found_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("report.pdf");
        // An unresolvable relay would fail the run if any network activity
        // happened; the missing attachment must win first.
        let err = send_report(
            &test_credentials(),
            "someone@example.com",
            &missing,
            "relay.invalid",
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::AttachmentNotFound(_)), "{err}");
    }

    #[test]
    fn build_message_fn_accepts_valid_addresses() {
        let message = build_message(
            "sender@example.com",
            "someone@example.com",
            "report.pdf".to_string(),
            b"%PDF-1.4".to_vec(),
        )
        .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains(SUBJECT));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("report.pdf"));
    }

    #[test]
    fn build_message_fn_rejects_malformed_addresses() {
        let err = build_message(
            "not an address",
            "someone@example.com",
            "report.pdf".to_string(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::DeliveryFailure(_)), "{err}");
    }

    #[test]
    fn is_auth_rejection_fn_flags_permanent_auth_category_replies() {
        // 535 bad credentials, 530 authentication required
        assert!(is_auth_rejection(true, Some("535")));
        assert!(is_auth_rejection(true, Some("530")));
    }

    #[test]
    fn is_auth_rejection_fn_passes_other_failures_through_as_transport() {
        // transient service-not-available
        assert!(!is_auth_rejection(false, Some("421")));
        // permanent, but not an authentication reply
        assert!(!is_auth_rejection(true, Some("550")));
        // connection-level failure with no reply code
        assert!(!is_auth_rejection(true, None));
    }

    #[test]
    fn credentials_debug_redacts_the_password() {
        let debug = format!("{:?}", test_credentials());
        assert!(debug.contains("sender@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
