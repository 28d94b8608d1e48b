//! Store backends: `localStorage` and `chrome.storage.local`

use std::collections::HashMap;

use am_core::KeyValueStore;
use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

// =============================================================================
// Page Store
// =============================================================================

/// `window.localStorage`. Access failures read as absent.
pub struct LocalStore {
    storage: Option<web_sys::Storage>,
}

impl LocalStore {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        Self { storage }
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.set_item(key, value);
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }
}

// =============================================================================
// Extension Store
// =============================================================================

/// Snapshot of `chrome.storage.local`, fetched once per pipeline run.
/// Writes update the snapshot and go through to the extension; `flush`
/// waits for them.
#[derive(Default)]
pub struct ExtensionStore {
    values: HashMap<String, String>,
    pending: Vec<Promise>,
}

impl ExtensionStore {
    /// Empty snapshot, for write-only use.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch `keys`. A missing API or failed read yields an empty snapshot.
    pub async fn load(keys: &[&str]) -> Self {
        let mut store = Self::default();
        match fetch(keys).await {
            Ok(result) => {
                for key in keys {
                    let value = Reflect::get(&result, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED);
                    if let Some(text) = encode_value(&value) {
                        store.values.insert(key.to_string(), text);
                    }
                }
            }
            Err(err) => log::debug!("extension storage unavailable: {:?}", err),
        }
        store
    }

    /// Wait for all writes issued through this snapshot.
    pub async fn flush(&mut self) {
        for promise in self.pending.drain(..) {
            if let Err(err) = JsFuture::from(promise).await {
                log::warn!("extension storage write failed: {:?}", err);
            }
        }
    }

    fn write(&mut self, key: &str, value: JsValue) {
        let items = Object::new();
        let _ = Reflect::set(&items, &JsValue::from_str(key), &value);

        let issued = storage_local()
            .and_then(|local| call_method(&local, "set", &items))
            .and_then(|ret| ret.dyn_into::<Promise>());
        match issued {
            Ok(promise) => self.pending.push(promise),
            Err(err) => log::debug!("extension storage write skipped: {:?}", err),
        }
    }
}

impl KeyValueStore for ExtensionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.write(key, decode_value(value));
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
        let issued = storage_local()
            .and_then(|local| call_method(&local, "remove", &JsValue::from_str(key)))
            .and_then(|ret| ret.dyn_into::<Promise>());
        if let Ok(promise) = issued {
            self.pending.push(promise);
        }
    }
}

async fn fetch(keys: &[&str]) -> Result<JsValue, JsValue> {
    let local = storage_local()?;
    let names: Array = keys.iter().map(|k| JsValue::from_str(k)).collect();
    let promise: Promise = call_method(&local, "get", &names)?.dyn_into()?;
    JsFuture::from(promise).await
}

/// `globalThis.chrome.storage.local`
fn storage_local() -> Result<JsValue, JsValue> {
    let chrome = Reflect::get(&js_sys::global(), &JsValue::from_str("chrome"))?;
    let storage = Reflect::get(&chrome, &JsValue::from_str("storage"))?;
    let local = Reflect::get(&storage, &JsValue::from_str("local"))?;
    if local.is_undefined() {
        return Err(JsValue::from_str("chrome.storage.local is not available"));
    }
    Ok(local)
}

fn call_method(target: &JsValue, name: &str, arg: &JsValue) -> Result<JsValue, JsValue> {
    let method: Function = Reflect::get(target, &JsValue::from_str(name))?.dyn_into()?;
    method.call1(target, arg)
}

/// Extension values are typed JSON; the core store speaks strings.
fn encode_value(value: &JsValue) -> Option<String> {
    if let Some(flag) = value.as_bool() {
        return Some(flag.to_string());
    }
    if let Some(number) = value.as_f64() {
        return Some(number.to_string());
    }
    value.as_string()
}

fn decode_value(text: &str) -> JsValue {
    match text {
        "true" => JsValue::TRUE,
        "false" => JsValue::FALSE,
        other => JsValue::from_str(other),
    }
}

/// The chrome runtime URL of a packaged asset, if the API is present.
pub fn asset_url(path: &str) -> Option<String> {
    let chrome = Reflect::get(&js_sys::global(), &JsValue::from_str("chrome")).ok()?;
    let runtime = Reflect::get(&chrome, &JsValue::from_str("runtime")).ok()?;
    call_method(&runtime, "getURL", &JsValue::from_str(path))
        .ok()?
        .as_string()
}
