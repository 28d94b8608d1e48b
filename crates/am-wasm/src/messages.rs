//! `chrome.runtime.onMessage` listener

use am_core::{Message, MessageEffect, Stores};
use js_sys::{Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;

use crate::storage::{ExtensionStore, LocalStore};
use crate::timers::set_timeout;
use crate::{config, current_route, homepage};

/// Register the listener for the page lifetime. Missing runtime API is a no-op.
pub fn listen() {
    let callback = Closure::<dyn FnMut(JsValue, JsValue, JsValue) -> JsValue>::new(
        |message: JsValue, _sender: JsValue, _respond: JsValue| {
            match serde_wasm_bindgen::from_value::<Message>(message) {
                Ok(message) => spawn_local(dispatch(message)),
                Err(err) => log::debug!("ignoring message: {}", err),
            }
            JsValue::FALSE
        },
    );

    if let Err(err) = add_listener(callback.as_ref()) {
        log::debug!("runtime messaging unavailable: {:?}", err);
    }
    callback.forget();
}

fn add_listener(callback: &JsValue) -> Result<(), JsValue> {
    let chrome = Reflect::get(&js_sys::global(), &JsValue::from_str("chrome"))?;
    let runtime = Reflect::get(&chrome, &JsValue::from_str("runtime"))?;
    let on_message = Reflect::get(&runtime, &JsValue::from_str("onMessage"))?;
    let add: Function = Reflect::get(&on_message, &JsValue::from_str("addListener"))?.dyn_into()?;
    add.call1(&on_message, callback)?;
    Ok(())
}

async fn dispatch(message: Message) {
    let mut extension = ExtensionStore::empty();
    let mut local = LocalStore::new();
    let route = current_route();

    let effect = message.handle(route, &mut Stores::new(&mut extension, &mut local), &config().timings);
    extension.flush().await;

    match effect {
        MessageEffect::Reapply(delay) => set_timeout(delay, homepage::schedule_run),
        MessageEffect::LiftSuppression => homepage::lift(),
        MessageEffect::None => {}
    }
}
