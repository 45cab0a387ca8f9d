//! Browser tests against real `localStorage`
//!
//! Run with `wasm-pack test --headless --firefox prefkit-wasm`.

#![cfg(target_arch = "wasm32")]

use prefkit_wasm::{delete_preferences, encrypted_preferences, exist, preferences};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn local_item(name: &str) -> Option<String> {
    web_sys_storage().get_item(name).unwrap()
}

fn web_sys_storage() -> web_sys::Storage {
    web_sys::window().unwrap().local_storage().unwrap().unwrap()
}

#[wasm_bindgen_test]
fn test_save_writes_local_storage() {
    delete_preferences("web-plain").unwrap();
    assert!(!exist("web-plain"));

    let mut prefs = preferences("web-plain").unwrap();
    prefs.put_i32("count", 7);
    prefs.put_bytes("seed", &[0, 255]).unwrap();
    assert!(local_item("web-plain").is_none());
    prefs.save().unwrap();

    assert!(exist("web-plain"));
    assert!(local_item("web-plain").is_some());

    let prefs = preferences("web-plain").unwrap();
    assert_eq!(prefs.get_i32("count"), Some(7));
    assert_eq!(prefs.get_bytes("seed"), Some(vec![0, 255]));

    delete_preferences("web-plain").unwrap();
    assert!(local_item("web-plain").is_none());
}

#[wasm_bindgen_test]
fn test_encrypted_store_rejects_wrong_password() {
    delete_preferences("web-vault").unwrap();
    let mut prefs = encrypted_preferences("web-vault", "pw").unwrap();
    assert!(prefs.is_encrypted());
    prefs.put_str("token", "s3cr3t").unwrap();
    prefs.save().unwrap();
    assert!(!local_item("web-vault").unwrap().contains("s3cr3t"));

    let err: JsValue = encrypted_preferences("web-vault", "nope").unwrap_err().into();
    assert!(err.as_string().unwrap().starts_with("AuthenticationFailed"));

    let prefs = encrypted_preferences("web-vault", "pw").unwrap();
    assert_eq!(prefs.get_str("token").as_deref(), Some("s3cr3t"));
    delete_preferences("web-vault").unwrap();
}

#[wasm_bindgen_test]
fn test_invalid_name_throws() {
    let err: JsValue = preferences("a/b").unwrap_err().into();
    assert!(err.as_string().unwrap().starts_with("InvalidName"));
}

#[wasm_bindgen_test]
fn test_empty_item_reads_as_absent() {
    web_sys_storage().set_item("web-empty", "").unwrap();
    assert!(!exist("web-empty"));
    let prefs = preferences("web-empty").unwrap();
    assert!(prefs.keys().is_empty());
    delete_preferences("web-empty").unwrap();
}
