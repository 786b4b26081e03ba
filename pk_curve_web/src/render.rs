//! The server-rendered variant: POST the form, receive an image URL, and
//! swap the sized image into the page.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::EventListener;
use leptos::{spawn_local, SignalSet, WriteSignal};
use pk_curve::{encode_fields, fit_to_width, RENDER_ENDPOINT};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, AbortSignal, Document, HtmlImageElement, Request, RequestInit, Response};

use crate::dom;

const RENDERED_CLASS: &str = "rendered-chart";

/// Tracks the in-flight render request and a submission generation so a
/// superseded submission can neither clobber the page nor report errors.
#[derive(Default)]
pub struct Inflight {
    controller: Option<AbortController>,
    generation: u64,
}

enum FetchError {
    Aborted,
    Failed(String),
}

pub fn submit(
    fields: Vec<(String, String)>,
    inflight: &Rc<RefCell<Inflight>>,
    set_status: WriteSignal<String>,
) {
    let (generation, signal) = {
        let mut state = inflight.borrow_mut();
        if let Some(previous) = state.controller.take() {
            previous.abort();
        }
        let controller = AbortController::new().ok();
        let signal = controller.as_ref().map(|c| c.signal());
        state.controller = controller;
        state.generation += 1;
        (state.generation, signal)
    };

    set_status.set("Rendering chart…".to_string());
    let body = encode_fields(&fields);
    let inflight = Rc::clone(inflight);
    spawn_local(async move {
        match request_rendered_url(&body, signal.as_ref()).await {
            Ok(url) => {
                if inflight.borrow().generation != generation {
                    return;
                }
                set_status.set(String::new());
                swap_rendered_image(&url, generation, &inflight, set_status);
            }
            Err(FetchError::Aborted) => {}
            Err(FetchError::Failed(message)) => {
                if inflight.borrow().generation != generation {
                    return;
                }
                set_status.set(format!("Render request failed: {message}"));
            }
        }
    });
}

async fn request_rendered_url(
    body: &str,
    signal: Option<&AbortSignal>,
) -> Result<String, FetchError> {
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(body));
    init.set_signal(signal);
    let request =
        Request::new_with_str_and_init(RENDER_ENDPOINT, &init).map_err(describe_failure)?;
    request
        .headers()
        .set("Content-Type", "application/x-www-form-urlencoded")
        .map_err(describe_failure)?;

    let window = web_sys::window().ok_or(FetchError::Failed("no window".to_string()))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(classify_failure)?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| FetchError::Failed("unexpected fetch result".to_string()))?;
    if !response.ok() {
        return Err(FetchError::Failed(format!("HTTP {}", response.status())));
    }
    let text = JsFuture::from(response.text().map_err(describe_failure)?)
        .await
        .map_err(classify_failure)?;
    text.as_string()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FetchError::Failed("empty response body".to_string()))
}

fn classify_failure(err: JsValue) -> FetchError {
    let name = js_sys::Reflect::get(&err, &JsValue::from_str("name"))
        .ok()
        .and_then(|v| v.as_string());
    if name.as_deref() == Some("AbortError") {
        FetchError::Aborted
    } else {
        describe_failure(err)
    }
}

fn describe_failure(err: JsValue) -> FetchError {
    let message = js_sys::Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| "network error".to_string());
    FetchError::Failed(message)
}

/// Engines whose image elements expose `decode()` fire load events reliably
/// while the element is detached, so attachment can wait until the image is
/// sized. On older engines the still-loading image goes into the document
/// before its source is set.
fn attach_before_load(img: &HtmlImageElement) -> bool {
    !js_sys::Reflect::has(img.as_ref(), &JsValue::from_str("decode")).unwrap_or(false)
}

fn swap_rendered_image(
    url: &str,
    generation: u64,
    inflight: &Rc<RefCell<Inflight>>,
    set_status: WriteSignal<String>,
) {
    let Some(doc) = dom::document() else { return };
    let Ok(element) = doc.create_element("img") else {
        set_status.set("Failed to create chart element".to_string());
        return;
    };
    let img: HtmlImageElement = element.unchecked_into();
    img.set_id(dom::CHART_IMG_ID);
    img.set_class_name(RENDERED_CLASS);
    img.set_alt("concentration chart");

    let attached_early = attach_before_load(&img);
    if attached_early {
        replace_current_chart(&doc, &img);
    }

    let loaded = img.clone();
    let inflight_load = Rc::clone(inflight);
    EventListener::once(&img, "load", move |_| {
        if inflight_load.borrow().generation != generation {
            return;
        }
        size_and_attach(&loaded, attached_early);
    })
    .forget();

    let inflight_error = Rc::clone(inflight);
    EventListener::once(&img, "error", move |_| {
        if inflight_error.borrow().generation != generation {
            return;
        }
        set_status.set("Failed to load the rendered chart".to_string());
    })
    .forget();

    img.set_src(url);
}

/// Sizes the image to the container width (shrink only) and attaches it if
/// the legacy path has not already done so.
fn size_and_attach(img: &HtmlImageElement, attached_early: bool) {
    let Some(doc) = dom::document() else { return };
    if let Some(container) = doc.get_element_by_id(dom::CHART_CONTAINER_ID) {
        let container_w = container.client_width().max(0) as u32;
        let (width, height) = fit_to_width(img.natural_width(), img.natural_height(), container_w);
        img.set_width(width);
        img.set_height(height);
    }
    if !attached_early {
        replace_current_chart(&doc, img);
    }
}

fn replace_current_chart(doc: &Document, img: &HtmlImageElement) {
    if let Some(current) = doc.get_element_by_id(dom::CHART_IMG_ID) {
        if let Some(parent) = current.parent_node() {
            let _ = parent.replace_child(img.as_ref(), &current);
            return;
        }
    }
    if let Some(container) = doc.get_element_by_id(dom::CHART_CONTAINER_ID) {
        container.set_inner_html("");
        let _ = container.append_child(img.as_ref());
    }
}
