//! The ordered admission table.
//!
//! Rules are evaluated top to bottom. A rule either lets evaluation
//! [`Continue`](Step::Continue) or ends it with an [`Outcome`]; the first
//! terminal rule wins. The table ends in a fallback that always terminates,
//! so every request yields exactly one outcome.
//!
//! | Rule                    | Applies to                                  |
//! |-------------------------|---------------------------------------------|
//! | `head-banned`           | `HEAD`                                      |
//! | `options-banned`        | `OPTIONS`                                   |
//! | `pic-requires-auth`     | `GET`/`POST`/`DELETE` on the picture path   |
//! | `delete-banned`         | `DELETE` elsewhere                          |
//! | `method-supported`      | anything but `GET`/`POST`/`PUT`/`DELETE`    |
//! | `healthz-get`           | `GET /healthz`                              |
//! | `healthz-open`          | `/healthz`, any remaining method            |
//! | `post-auth-header`      | `POST`                                      |
//! | `verify-open`           | `GET` on the verify path                    |
//! | `get-requires-auth`     | other `GET`                                 |
//! | `put-requires-auth`     | `PUT`                                       |
//! | `datastore-healthy`     | everything that got this far                |
//! | `public-paths`          | register, `/healthz`, verify                |
//! | `verified-user`         | fallback: Basic credential + directory      |

use std::time::Instant;

use crate::credential::extract_credential;
use crate::decision::Outcome;
use crate::directory::UserDirectory;
use crate::error::GateError;
use crate::health::HealthProbe;
use crate::metrics::{MetricsSink, HEALTH_PROBE_TIMER};
use crate::RequestSnapshot;

/// Health check endpoint.
pub const HEALTHZ_PATH: &str = "/healthz";
/// Account registration endpoint.
pub const REGISTER_PATH: &str = "/api/v1/users/register";
/// Email verification endpoint.
pub const VERIFY_PATH: &str = "/api/v1/users/verify";
/// Profile picture endpoint.
pub const PIC_PATH: &str = "/api/v1/users/pic";

/// Paths admitted without a directory lookup once the datastore is healthy.
pub const PUBLIC_PATHS: &[&str] = &[REGISTER_PATH, HEALTHZ_PATH, VERIFY_PATH];

/// Methods the service routes at all.
pub const SUPPORTED_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];

/// Methods the picture path accepts.
const PIC_METHODS: &[&str] = &["DELETE", "POST", "GET"];

/// Everything a rule may look at.
///
/// Collaborators are borrowed from the gate; rules never own or mutate them.
pub struct RuleContext<'a> {
    /// The request under evaluation.
    pub request: &'a RequestSnapshot,
    /// Datastore health probe.
    pub probe: &'a dyn HealthProbe,
    /// User directory.
    pub directory: &'a dyn UserDirectory,
    /// Metrics sink, for timing collaborator calls.
    pub metrics: &'a dyn MetricsSink,
}

/// Result of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The rule does not decide; try the next one.
    Continue,
    /// Evaluation ends here.
    Done(Outcome),
}

/// One named entry in the admission table.
#[derive(Clone, Copy)]
pub struct PolicyRule {
    name: &'static str,
    check: fn(&RuleContext<'_>) -> Result<Step, GateError>,
}

impl PolicyRule {
    /// Stable rule name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies the rule.
    ///
    /// # Errors
    ///
    /// Returns a [`GateError`] when a collaborator the rule consults fails.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Step, GateError> {
        (self.check)(ctx)
    }
}

impl std::fmt::Debug for PolicyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRule").field("name", &self.name).finish()
    }
}

/// The rule that always decides when nothing before it did.
#[derive(Clone, Copy)]
pub struct FallbackRule {
    name: &'static str,
    decide: fn(&RuleContext<'_>) -> Result<Outcome, GateError>,
}

impl FallbackRule {
    /// Stable rule name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies the fallback.
    ///
    /// # Errors
    ///
    /// Returns a [`GateError`] when a collaborator the rule consults fails.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Outcome, GateError> {
        (self.decide)(ctx)
    }
}

impl std::fmt::Debug for FallbackRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackRule").field("name", &self.name).finish()
    }
}

/// An ordered rule list plus its terminal fallback.
#[derive(Debug, Clone, Copy)]
pub struct PolicyTable {
    rules: &'static [PolicyRule],
    fallback: FallbackRule,
}

impl PolicyTable {
    /// The ordered, non-terminal-by-construction rules.
    pub fn rules(&self) -> &'static [PolicyRule] {
        self.rules
    }

    /// The rule evaluated when every other rule continued.
    pub fn fallback(&self) -> &FallbackRule {
        &self.fallback
    }
}

/// The admission table for the user-account service.
pub static ADMISSION_TABLE: PolicyTable = PolicyTable {
    rules: &[
        PolicyRule {
            name: "head-banned",
            check: head_banned,
        },
        PolicyRule {
            name: "options-banned",
            check: options_banned,
        },
        PolicyRule {
            name: "pic-requires-auth",
            check: pic_requires_auth,
        },
        PolicyRule {
            name: "delete-banned",
            check: delete_banned,
        },
        PolicyRule {
            name: "method-supported",
            check: method_supported,
        },
        PolicyRule {
            name: "healthz-get",
            check: healthz_get,
        },
        PolicyRule {
            name: "healthz-open",
            check: healthz_open,
        },
        PolicyRule {
            name: "post-auth-header",
            check: post_auth_header,
        },
        PolicyRule {
            name: "verify-open",
            check: verify_open,
        },
        PolicyRule {
            name: "get-requires-auth",
            check: get_requires_auth,
        },
        PolicyRule {
            name: "put-requires-auth",
            check: put_requires_auth,
        },
        PolicyRule {
            name: "datastore-healthy",
            check: datastore_healthy,
        },
        PolicyRule {
            name: "public-paths",
            check: public_paths,
        },
    ],
    fallback: FallbackRule {
        name: "verified-user",
        decide: verified_user,
    },
};

fn is_pic_method(request: &RequestSnapshot) -> bool {
    request.path() == PIC_PATH && PIC_METHODS.iter().any(|m| request.method_is(m))
}

fn head_banned(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    if ctx.request.method_is("HEAD") {
        return Ok(Step::Done(Outcome::HeadRejected));
    }
    Ok(Step::Continue)
}

fn options_banned(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    if ctx.request.method_is("OPTIONS") {
        return Ok(Step::Done(Outcome::OptionsRejected));
    }
    Ok(Step::Continue)
}

fn pic_requires_auth(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    let request = ctx.request;
    if is_pic_method(request) && request.auth_header_missing_or_empty() {
        return Ok(Step::Done(Outcome::AuthHeaderMissing(format!(
            "{} request requires Authorization header.",
            request.method()
        ))));
    }
    Ok(Step::Continue)
}

fn delete_banned(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    // DELETE on the picture path was already vetted by `pic-requires-auth`.
    if ctx.request.method_is("DELETE") && !is_pic_method(ctx.request) {
        return Ok(Step::Done(Outcome::DeleteRejected));
    }
    Ok(Step::Continue)
}

fn method_supported(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    let request = ctx.request;
    if !SUPPORTED_METHODS.iter().any(|m| request.method_is(m)) {
        return Ok(Step::Done(Outcome::UnsupportedMethod(
            request.method().to_string(),
        )));
    }
    Ok(Step::Continue)
}

fn healthz_get(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    let request = ctx.request;
    if request.path() != HEALTHZ_PATH || !request.method_is("GET") {
        return Ok(Step::Continue);
    }
    if request.has_auth_header() {
        Ok(Step::Done(Outcome::HealthzAuthHeaderPresent))
    } else {
        Ok(Step::Done(Outcome::HealthzAdmitted))
    }
}

fn healthz_open(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    if ctx.request.path() == HEALTHZ_PATH {
        return Ok(Step::Done(Outcome::HealthzAdmitted));
    }
    Ok(Step::Continue)
}

fn post_auth_header(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    let request = ctx.request;
    if !request.method_is("POST") {
        return Ok(Step::Continue);
    }
    if request.path() == PIC_PATH {
        if request.auth_header_missing_or_empty() {
            return Ok(Step::Done(Outcome::AuthHeaderMissing(
                "POST profile picture request requires Authorization header.".to_string(),
            )));
        }
    } else if request.has_auth_header() {
        return Ok(Step::Done(Outcome::PostAuthHeaderPresent));
    }
    Ok(Step::Continue)
}

fn verify_open(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    let request = ctx.request;
    if !request.method_is("GET") || request.path() != VERIFY_PATH {
        return Ok(Step::Continue);
    }
    if request.has_auth_header() {
        Ok(Step::Done(Outcome::VerifyAuthHeaderPresent))
    } else {
        Ok(Step::Done(Outcome::VerifyAdmitted))
    }
}

fn get_requires_auth(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    if ctx.request.method_is("GET") && !ctx.request.has_auth_header() {
        return Ok(Step::Done(Outcome::AuthHeaderMissing(
            "GET request except verify requires Authorization header.".to_string(),
        )));
    }
    Ok(Step::Continue)
}

fn put_requires_auth(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    if ctx.request.method_is("PUT") && !ctx.request.has_auth_header() {
        return Ok(Step::Done(Outcome::AuthHeaderMissing(
            "PUT request requires Authorization header.".to_string(),
        )));
    }
    Ok(Step::Continue)
}

fn datastore_healthy(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    let started = Instant::now();
    let healthy = ctx.probe.check();
    ctx.metrics.record_timing(HEALTH_PROBE_TIMER, started.elapsed());

    if healthy? {
        Ok(Step::Continue)
    } else {
        Ok(Step::Done(Outcome::DatabaseUnavailable))
    }
}

fn public_paths(ctx: &RuleContext<'_>) -> Result<Step, GateError> {
    let request = ctx.request;
    if !PUBLIC_PATHS.contains(&request.path()) {
        return Ok(Step::Continue);
    }
    if request.path() == REGISTER_PATH && request.has_auth_header() {
        return Ok(Step::Done(Outcome::RegisterAuthHeaderPresent));
    }
    Ok(Step::Done(Outcome::PublicAdmitted))
}

fn verified_user(ctx: &RuleContext<'_>) -> Result<Outcome, GateError> {
    let credential = match extract_credential(ctx.request.auth_header_value()) {
        Some(credential) if !credential.username().is_empty() => credential,
        _ => return Ok(Outcome::AuthHeaderInvalid),
    };

    let outcome = match ctx.directory.find_by_email(credential.username())? {
        None => {
            tracing::info!(
                request_id = %ctx.request.request_id(),
                username = %credential.username(),
                "user not found"
            );
            Outcome::UserNotFound
        }
        Some(user) if !user.verified => {
            tracing::info!(
                request_id = %ctx.request.request_id(),
                username = %user.email,
                "user found but not verified"
            );
            Outcome::UserNotVerified
        }
        Some(_) => Outcome::Admitted,
    };
    Ok(outcome)
}
