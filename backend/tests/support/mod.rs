#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use serde_json::{json, Value};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Every manifest variable, cleared.
pub const CLEAR_MANIFEST_ENV: &[(&str, Option<&str>)] = &[
    ("MANIFEST_CONFIG", None),
    ("MANIFEST_SOURCE", None),
    ("MANIFEST_API_URL", None),
    ("MANIFEST_API_KEY", None),
    ("MANIFEST_COLLECTION", None),
    ("MANIFEST_API_TIMEOUT_SECS", None),
    ("MANIFEST_SEED_FILE", None),
];

/// Two containers sharing one AWB, one AWB per container on its own, and a
/// masterbill without AWB number.
pub fn two_container_document(id: &str) -> Value {
    json!({
        "id": id,
        "createdAt": "2024-05-01T08:00:00Z",
        "manifestInfo": {
            "manifestNo": format!("MAN-{}", id),
            "flightNo": "LH8160",
            "pointOfLoading": "FRA",
            "pointOfUnloading": "ORD",
            "ownerOrOperator": "LH",
            "registration": "D-ALFA",
            "flightDate": "2024-05-02"
        },
        "containers": [
            {
                "containerNumber": "PMC10001LH",
                "masterbills": [
                    {
                        "masterbillNumber": "020-11111111",
                        "natureOfGoods": "AUTO PARTS",
                        "shcs": ["HEA"],
                        "housebills": [
                            {"housebillNumber": "HB-1", "customer": {"name": "Bosch"}, "pieces": [{"weight": 100}, {"weight": 50}]},
                            {"housebillNumber": "HB-2", "customer": "Continental", "pieces": [{"weight": "25.5"}]}
                        ]
                    },
                    {
                        "masterbillNumber": "",
                        "housebills": [{"pieces": [{"weight": 999}]}]
                    }
                ]
            },
            {
                "containerNumber": "AKE20002LH",
                "masterbills": [
                    {
                        "masterbillNumber": "020-11111111",
                        "shcs": [{"code": "ELI"}],
                        "housebills": [
                            {"housebillNumber": "HB-3", "customer": "Bosch", "pieces": [{"weight": 10}]}
                        ]
                    },
                    {
                        "masterbillNumber": "020-22222222",
                        "natureOfGoods": "PHARMA",
                        "shcs": ["PIL", "COL"],
                        "housebills": [
                            {"housebillNumber": "HB-4", "customer": "Bayer", "pieces": [{"weight": 40}, {"weight": 20}]}
                        ]
                    }
                ]
            }
        ]
    })
}

/// Raw listing fixture for the local source.
pub fn listing_documents() -> Vec<Value> {
    let mut docs = Vec::new();
    for (i, (flight, pol, date)) in [
        ("LH400", "FRA", "2024-05-01"),
        ("LH401", "MUC", "2024-05-03"),
        ("BA117", "LHR", "2024-05-05"),
        ("LH8160", "FRA", "2024-05-07"),
    ]
    .into_iter()
    .enumerate()
    {
        docs.push(json!({
            "id": format!("m{}", i + 1),
            "createdAt": format!("2024-04-0{}T00:00:00Z", i + 1),
            "manifestInfo": {
                "manifestNo": format!("MAN-00{}", i + 1),
                "flightNo": flight,
                "pointOfLoading": pol,
                "pointOfUnloading": "JFK",
                "flightDate": date
            }
        }));
    }
    docs
}
