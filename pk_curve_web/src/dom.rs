//! Direct DOM updates for the inline chart variants.

use pk_curve::{chart_query, CHART_ENDPOINT, CSV_ENDPOINT};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlAnchorElement, HtmlFormElement, HtmlImageElement};

/// Container that receives the generated chart markup.
pub const CHART_CONTAINER_ID: &str = "chart-container";
/// The chart image element; recreated on every submission.
pub const CHART_IMG_ID: &str = "chart";

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Reads the form's live controls as name/value pairs, in control order.
/// Non-string entries (file inputs) are dropped.
pub fn serialize_form(form: &HtmlFormElement) -> Result<Vec<(String, String)>, String> {
    let data = web_sys::FormData::new_with_form(form)
        .map_err(|_| "failed to read form fields".to_string())?;
    let mut fields = Vec::new();
    for entry in data.entries() {
        let Ok(entry) = entry else { continue };
        let pair = js_sys::Array::from(&entry);
        if let (Some(name), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
            fields.push((name, value));
        }
    }
    Ok(fields)
}

/// Replaces the container's contents with one image pointing at the chart
/// endpoint. Load failures are left to the browser's broken-image behavior.
pub fn show_inline_chart(fields: &[(String, String)]) {
    let url = chart_query(CHART_ENDPOINT, fields, now_ms());
    let Some(doc) = document() else { return };
    let Some(container) = doc.get_element_by_id(CHART_CONTAINER_ID) else {
        return;
    };
    container.set_inner_html("");
    if let Some(img) = create_chart_image(&doc, &url) {
        let _ = container.append_child(&img);
    }
}

/// Replaces the container's contents with a CSV download link, a line break
/// and the chart image, both URLs sharing one query suffix.
pub fn show_inline_chart_with_csv(fields: &[(String, String)]) {
    let dummy = now_ms();
    let csv_url = chart_query(CSV_ENDPOINT, fields, dummy);
    let chart_url = chart_query(CHART_ENDPOINT, fields, dummy);
    let Some(doc) = document() else { return };
    let Some(container) = doc.get_element_by_id(CHART_CONTAINER_ID) else {
        return;
    };
    container.set_inner_html("");
    if let Some(link) = create_csv_link(&doc, &csv_url) {
        let _ = container.append_child(&link);
    }
    if let Ok(br) = doc.create_element("br") {
        let _ = container.append_child(&br);
    }
    if let Some(img) = create_chart_image(&doc, &chart_url) {
        let _ = container.append_child(&img);
    }
}

fn create_chart_image(doc: &Document, url: &str) -> Option<HtmlImageElement> {
    let img: HtmlImageElement = doc.create_element("img").ok()?.unchecked_into();
    img.set_id(CHART_IMG_ID);
    img.set_alt("concentration chart");
    img.set_src(url);
    Some(img)
}

fn create_csv_link(doc: &Document, url: &str) -> Option<HtmlAnchorElement> {
    let link: HtmlAnchorElement = doc.create_element("a").ok()?.unchecked_into();
    link.set_href(url);
    link.set_download("concentration.csv");
    link.set_text_content(Some("Download data as CSV"));
    Some(link)
}
