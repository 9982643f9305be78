//! End-to-end admission behaviour of the gate.
//!
//! Each test drives the public `AdmissionGate` API with observable fakes for
//! the health probe, user directory and metrics sink.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use admission_gate::{
    AdmissionGate, Decision, GateConfig, GateError, InMemoryDirectory, ProbeError, RejectionKind,
    RequestSnapshot,
};
use common::{basic, init_tracing, Harness, UNKNOWN, UNVERIFIED, VERIFIED};

const PIC: &str = "/api/v1/users/pic";
const REGISTER: &str = "/api/v1/users/register";
const VERIFY: &str = "/api/v1/users/verify";
const SELF: &str = "/api/v1/users/self";

fn req(method: &str, path: &str) -> RequestSnapshot {
    RequestSnapshot::new("req-it", method, path)
}

fn message(decision: &Decision) -> &str {
    &decision.rejection().expect("rejected").message
}

#[test]
fn head_and_options_are_always_405() {
    init_tracing();
    let h = Harness::new(true);

    for method in ["HEAD", "head", "OPTIONS", "options"] {
        for path in ["/healthz", PIC, REGISTER, SELF] {
            let plain = h.gate.evaluate(&req(method, path)).unwrap();
            let authed = h
                .gate
                .evaluate(&req(method, path).with_auth_header(basic(VERIFIED, "pw")))
                .unwrap();
            assert_eq!(plain.status(), Some(405), "{method} {path}");
            assert_eq!(authed.status(), Some(405), "{method} {path}");
        }
    }
    assert_eq!(h.probe.calls(), 0);
}

#[test]
fn healthz_get_rejects_authorization_header() {
    let h = Harness::new(true);

    let with_header = h
        .gate
        .evaluate(&req("GET", "/healthz").with_auth_header("Basic eDp5"))
        .unwrap();
    assert_eq!(with_header.status(), Some(400));
    assert_eq!(
        message(&with_header),
        "healthz request with Authorization header is not required."
    );

    let without = h.gate.evaluate(&req("GET", "/healthz")).unwrap();
    assert_eq!(without, Decision::Allow);
    assert_eq!(h.probe.calls(), 0);
}

#[test]
fn healthz_is_open_for_other_methods_without_probe() {
    let h = Harness::new(false);

    for method in ["POST", "PUT"] {
        let decision = h
            .gate
            .evaluate(&req(method, "/healthz").with_auth_header("anything"))
            .unwrap();
        assert!(decision.is_allow(), "{method}");
    }
    assert_eq!(h.probe.calls(), 0);
    assert_eq!(h.metrics.count("api.request.healthz.success"), 2);
}

#[test]
fn register_rejects_header_and_admits_without() {
    let h = Harness::new(true);

    let with_header = h
        .gate
        .evaluate(&req("POST", REGISTER).with_auth_header(basic(VERIFIED, "pw")))
        .unwrap();
    assert_eq!(with_header.status(), Some(400));

    let without = h.gate.evaluate(&req("POST", REGISTER)).unwrap();
    assert!(without.is_allow());
    assert_eq!(h.metrics.count("api.request.public.success"), 1);
    assert_eq!(h.directory.calls(), 0);
}

#[test]
fn register_with_header_via_put_fails_at_public_rule() {
    let h = Harness::new(true);

    let decision = h
        .gate
        .evaluate(&req("PUT", REGISTER).with_auth_header(basic(VERIFIED, "pw")))
        .unwrap();
    assert_eq!(
        message(&decision),
        "Authorization header is not allowed for register"
    );
    assert_eq!(h.probe.calls(), 1);
}

#[test]
fn delete_pic_requires_verified_user() {
    let h = Harness::new(true);

    let verified = h
        .gate
        .evaluate(&req("DELETE", PIC).with_auth_header(basic(VERIFIED, "pw")))
        .unwrap();
    assert_eq!(verified, Decision::Allow);

    let unverified = h
        .gate
        .evaluate(&req("DELETE", PIC).with_auth_header(basic(UNVERIFIED, "pw")))
        .unwrap();
    assert_eq!(unverified.status(), Some(403));
    assert_eq!(
        unverified.rejection().unwrap().kind,
        RejectionKind::UserUnverified
    );
}

#[test]
fn delete_elsewhere_is_405_regardless_of_headers() {
    let h = Harness::new(true);

    for path in ["/healthz", REGISTER, VERIFY, SELF, "/api/v1/users/pic/"] {
        let plain = h.gate.evaluate(&req("DELETE", path)).unwrap();
        let authed = h
            .gate
            .evaluate(&req("DELETE", path).with_auth_header(basic(VERIFIED, "pw")))
            .unwrap();
        assert_eq!(plain.status(), Some(405), "{path}");
        assert_eq!(message(&authed), "DELETE method is not allowed for this endpoint.");
    }
}

#[test]
fn verify_is_open_only_without_header() {
    let h = Harness::new(false);

    let with_header = h
        .gate
        .evaluate(&req("GET", VERIFY).with_auth_header("Basic eDp5"))
        .unwrap();
    assert_eq!(with_header.status(), Some(400));
    assert_eq!(message(&with_header), "Authorization header is not allowed for verify");

    let without = h.gate.evaluate(&req("GET", VERIFY)).unwrap();
    assert!(without.is_allow());
    assert_eq!(h.probe.calls(), 0);
}

#[test]
fn unhealthy_datastore_is_503_without_directory_lookup() {
    let h = Harness::new(false);
    let request = req("GET", SELF).with_auth_header(basic(VERIFIED, "pw"));

    let first = h.gate.evaluate(&request).unwrap();
    let second = h.gate.evaluate(&request).unwrap();

    assert_eq!(first.status(), Some(503));
    assert_eq!(
        message(&first),
        "Service unavailable due to database connection issue."
    );
    assert_eq!(first, second);
    assert_eq!(h.probe.calls(), 2);
    assert_eq!(h.directory.calls(), 0);
    assert_eq!(h.metrics.count("api.request.dbConnection.failure"), 2);
}

#[test]
fn probe_is_consulted_at_most_once_per_request() {
    let h = Harness::new(true);

    h.gate
        .evaluate(&req("PUT", SELF).with_auth_header(basic(VERIFIED, "pw")))
        .unwrap();
    assert_eq!(h.probe.calls(), 1);

    h.gate.evaluate(&req("GET", SELF)).unwrap();
    assert_eq!(h.probe.calls(), 1);
}

#[test]
fn recovery_is_observed_on_next_request() {
    let h = Harness::new(false);
    let request = req("POST", REGISTER);

    assert_eq!(h.gate.evaluate(&request).unwrap().status(), Some(503));
    h.probe.set_healthy(true);
    assert!(h.gate.evaluate(&request).unwrap().is_allow());
}

#[test]
fn malformed_basic_header_is_invalid() {
    let h = Harness::new(true);
    let no_colon = format!(
        "Basic {}",
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, "alice@example.com")
    );

    for header in ["Basic !!!not-base64!!!".to_string(), no_colon, "Bearer abc".to_string()] {
        let decision = h
            .gate
            .evaluate(&req("GET", SELF).with_auth_header(header))
            .unwrap();
        assert_eq!(decision.status(), Some(400));
        assert_eq!(message(&decision), "Invalid Authorization header");
    }
    assert_eq!(h.directory.calls(), 0);
    assert_eq!(h.metrics.count("api.request.authHeader.invalid"), 3);
}

#[test]
fn unknown_and_unverified_users_share_403() {
    let h = Harness::new(true);

    let unknown = h
        .gate
        .evaluate(&req("PUT", SELF).with_auth_header(basic(UNKNOWN, "pw")))
        .unwrap();
    let unverified = h
        .gate
        .evaluate(&req("PUT", SELF).with_auth_header(basic(UNVERIFIED, "pw")))
        .unwrap();

    assert_eq!(unknown.status(), Some(403));
    assert_eq!(unverified.status(), Some(403));
    assert_eq!(message(&unknown), "User does not exist.");
    assert_eq!(
        message(&unverified),
        "User is not verified. Access is restricted."
    );
    assert_eq!(h.metrics.count("api.request.user.notFound"), 1);
    assert_eq!(h.metrics.count("api.request.user.notVerified"), 1);
}

#[test]
fn pic_get_without_header_fails_before_generic_get_rule() {
    let h = Harness::new(true);

    let decision = h.gate.evaluate(&req("GET", PIC)).unwrap();
    assert_eq!(decision.status(), Some(400));
    assert_eq!(message(&decision), "GET request requires Authorization header.");
    assert_eq!(h.probe.calls(), 0);
}

#[test]
fn pic_accepts_any_header_at_the_presence_rules() {
    let h = Harness::new(true);

    // Header presence satisfies the pic rules; credential parsing happens last.
    let decision = h
        .gate
        .evaluate(&req("POST", PIC).with_auth_header("Basic garbage"))
        .unwrap();
    assert_eq!(message(&decision), "Invalid Authorization header");
}

#[test]
fn unsupported_methods_are_named_in_message() {
    let h = Harness::new(true);

    let decision = h.gate.evaluate(&req("patch", SELF)).unwrap();
    assert_eq!(decision.status(), Some(405));
    assert_eq!(message(&decision), "HTTP method PATCH is not supported.");
    assert_eq!(h.metrics.count("api.request.unsupportedMethod"), 1);
    assert_eq!(h.metrics.count("api.request.patch"), 1);
}

#[test]
fn post_to_protected_path_without_header_needs_credentials() {
    let h = Harness::new(true);

    // POST without a header passes the POST rule and reaches the directory rule.
    let decision = h.gate.evaluate(&req("POST", SELF)).unwrap();
    assert_eq!(message(&decision), "Invalid Authorization header");
    assert_eq!(h.probe.calls(), 1);
}

#[test]
fn probe_errors_propagate_by_default() {
    let gate = AdmissionGate::new(
        Arc::new(|| -> Result<bool, ProbeError> { Err(ProbeError::Other("refused".to_string())) }),
        Arc::new(InMemoryDirectory::new()),
    );

    let result = gate.evaluate(&req("POST", REGISTER));
    assert!(matches!(result, Err(GateError::Probe(_))));
}

#[test]
fn configured_gate_bounds_slow_probe() {
    let config = GateConfig::from_toml_str("[health]\ntimeout_ms = 25\n").unwrap();
    let gate = AdmissionGate::from_config(
        &config,
        Arc::new(|| -> Result<bool, ProbeError> {
            thread::sleep(Duration::from_millis(500));
            Ok(true)
        }),
        Arc::new(InMemoryDirectory::new()),
    )
    .unwrap();

    let decision = gate.evaluate(&req("POST", REGISTER)).unwrap();
    assert_eq!(decision.status(), Some(503));
}

#[test]
fn stuck_datastore_holds_a_single_probe_worker() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (release, stuck) = mpsc::channel::<()>();
    let stuck = Mutex::new(stuck);
    let counted = Arc::clone(&calls);

    let config = GateConfig::from_toml_str("[health]\ntimeout_ms = 2\n").unwrap();
    let gate = AdmissionGate::from_config(
        &config,
        Arc::new(move || -> Result<bool, ProbeError> {
            counted.fetch_add(1, Ordering::SeqCst);
            let stuck = stuck.lock().map_err(|_| ProbeError::Disconnected)?;
            stuck.recv().map_err(|_| ProbeError::Disconnected)?;
            Ok(true)
        }),
        Arc::new(InMemoryDirectory::new()),
    )
    .unwrap();

    for _ in 0..100 {
        let decision = gate.evaluate(&req("POST", REGISTER)).unwrap();
        assert_eq!(decision.status(), Some(503));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    release.send(()).unwrap();
}

#[test]
fn configured_reject_policy_turns_errors_into_503() {
    let config = GateConfig::from_toml_str("failure_policy = \"reject\"\n").unwrap();
    let gate = AdmissionGate::from_config(
        &config,
        Arc::new(|| -> Result<bool, ProbeError> { Err(ProbeError::Other("refused".to_string())) }),
        Arc::new(InMemoryDirectory::new()),
    )
    .unwrap();

    let decision = gate.evaluate(&req("POST", REGISTER)).unwrap();
    assert_eq!(decision.status(), Some(503));
    assert_eq!(
        decision.rejection().unwrap().kind,
        RejectionKind::DependencyUnavailable
    );
}

#[test]
fn gate_is_shared_across_threads() {
    let h = Harness::new(true);
    let gate = Arc::new(h.gate);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let user = if i % 2 == 0 { VERIFIED } else { UNVERIFIED };
                let request = RequestSnapshot::new(format!("req-{i}"), "GET", SELF)
                    .with_auth_header(basic(user, "pw"));
                (i, gate.evaluate(&request).unwrap())
            })
        })
        .collect();

    for handle in handles {
        let (i, decision) = handle.join().unwrap();
        if i % 2 == 0 {
            assert!(decision.is_allow());
        } else {
            assert_eq!(decision.status(), Some(403));
        }
    }
    assert_eq!(h.metrics.count("api.request.total"), 8);
    assert_eq!(h.probe.calls(), 8);
}
