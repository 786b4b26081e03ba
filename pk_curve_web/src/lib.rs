use std::cell::RefCell;
use std::rc::Rc;

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlSelectElement;

mod dom;
mod render;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_COMMIT: &str = env!("GIT_COMMIT_HASH");

/// How a submission updates the chart region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UpdateMode {
    /// Point an inline image at the chart endpoint.
    Inline,
    /// Inline image plus a CSV download link.
    InlineWithCsv,
    /// POST the form, then size-fit the server-rendered image.
    ServerRendered,
}

impl UpdateMode {
    fn from_value(value: &str) -> Self {
        match value {
            "inline-csv" => UpdateMode::InlineWithCsv,
            "server" => UpdateMode::ServerRendered,
            _ => UpdateMode::Inline,
        }
    }
}

#[component]
pub fn App() -> impl IntoView {
    let (mode, set_mode) = create_signal(UpdateMode::Inline);
    let (status, set_status) = create_signal(String::new());
    let form_ref = create_node_ref::<html::Form>();
    let inflight = Rc::new(RefCell::new(render::Inflight::default()));

    let on_submit = {
        let inflight = Rc::clone(&inflight);
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            let Some(form) = form_ref.get() else { return };
            let fields = match dom::serialize_form(&form) {
                Ok(fields) => fields,
                Err(message) => {
                    set_status.set(message);
                    return;
                }
            };
            match mode.get_untracked() {
                UpdateMode::Inline => {
                    dom::show_inline_chart(&fields);
                    set_status.set(String::new());
                }
                UpdateMode::InlineWithCsv => {
                    dom::show_inline_chart_with_csv(&fields);
                    set_status.set(String::new());
                }
                UpdateMode::ServerRendered => {
                    render::submit(fields, &inflight, set_status);
                }
            }
        }
    };

    let on_mode = move |ev: ev::Event| {
        if let Some(target) = ev.target() {
            if let Ok(select) = target.dyn_into::<HtmlSelectElement>() {
                set_mode.set(UpdateMode::from_value(&select.value()));
            }
        }
    };

    view! {
        <main class="wrap">
            <header>
                <h1>"Pharmacokinetics"</h1>
                <p class="subtitle">"Calculate and plot drug concentration over time."</p>
            </header>
            <section class="controls">
                <form id="curve-form" node_ref=form_ref on:submit=on_submit>
                    <label>"Half-life: "<input type="text" name="hl" value="6"/></label>
                    <label>"Time to peak: "<input type="text" name="t-max" value="2"/></label>
                    <label>"Duration: "<input type="text" name="duration" value="24"/></label>
                    <label>"Doses: "<input type="text" name="doses" value="1"/></label>
                    <label>"Offsets: "<input type="text" name="offsets" value="0"/></label>
                    <button type="submit">"Plot"</button>
                </form>
                <label class="note">
                    "Update mode: "
                    <select on:change=on_mode>
                        <option value="inline" selected>"Inline chart"</option>
                        <option value="inline-csv">"Inline chart + CSV link"</option>
                        <option value="server">"Server-rendered (auto-fit)"</option>
                    </select>
                </label>
                <span class="note">{move || status.get()}</span>
            </section>
            <section class="plots">
                <div id="chart-container" class="plot">
                    <img id="chart" alt="concentration chart"/>
                </div>
            </section>
            <footer>
                <p class="note">{"Web version "}{APP_VERSION}{" ("}{APP_COMMIT}{")"}</p>
            </footer>
        </main>
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(|| view! { <App/> });
}
