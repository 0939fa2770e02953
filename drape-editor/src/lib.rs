#![allow(non_snake_case)]

use dioxus::prelude::*;
use drape_core::controls::{parse_slider, ROTATION_SLIDER, SIZE_SLIDER};
use drape_core::{CartLineItem, ContainerBox, DesignSession, EngineConfig, FileDescriptor, PerSide, PointerPos, Side, UploadOutcome};
use drape_dioxus::{render_line_item_to_rsx, render_side_to_rsx, side_layer, SideLayer};

const MAIN_CSS: Asset = asset!("/assets/editor.css");

const PRODUCT_ID: &str = "tee-classic";
const PREVIEW: ContainerBox = ContainerBox { width: 320.0, height: 380.0 };
const THUMBNAIL: ContainerBox = ContainerBox { width: 96.0, height: 112.0 };

fn side_title(side: Side) -> &'static str {
    match side {
        Side::Front => "Front",
        Side::Back => "Back",
    }
}

#[component]
pub fn DesignStudio() -> Element {
    let mut session = use_signal(DesignSession::default);
    let mut upload_errors = use_signal(PerSide::<Option<String>>::default);
    let mut cart = use_signal(Vec::<CartLineItem>::new);
    let mut cart_notice = use_signal(|| None::<String>);
    let mut last_json = use_signal(|| None::<String>);

    let mut upload = move |side: Side, evt: FormEvent| {
        let Some(file) = evt.files().into_iter().next() else {
            return;
        };
        let descriptor = FileDescriptor::new(file.name(), file.content_type().unwrap_or_default(), file.size());
        let ticket = match session.write().begin_upload(side, &descriptor) {
            Ok(ticket) => ticket,
            Err(e) => {
                *upload_errors.write().get_mut(side) = Some(e.to_string());
                return;
            }
        };
        *upload_errors.write().get_mut(side) = None;

        // front and back decode as independent tasks
        spawn(async move {
            let decoded = match file.read_bytes().await {
                Ok(bytes) => ticket.decode(&bytes),
                Err(e) => ticket.fail(e.to_string()),
            };
            match session.write().finish_upload(decoded) {
                Ok(UploadOutcome::Applied) => {}
                Ok(UploadOutcome::Stale) => tracing::debug!(%side, "upload superseded"),
                Err(e) => *upload_errors.write().get_mut(side) = Some(e.to_string()),
            }
        });
    };

    let state = session.read();
    let config = state.config().clone();
    let active = state.active_side();
    let transform = state.transform(active);
    let has_active_image = state.image(active).is_some();
    let dragging = state.is_dragging();
    let can_add = state.can_add_to_cart();
    let garment_size = state.garment_size().map(str::to_string);
    let color = state.color().to_string();
    let preview_layer = state
        .side_design(active)
        .map(|design| side_layer(Some(&design), PREVIEW, state.store(), &config));
    let thumbnails: Vec<(Side, Element)> = Side::ALL
        .into_iter()
        .map(|side| {
            let design = state.side_design(side);
            (side, render_side_to_rsx(design.as_ref(), THUMBNAIL, &color, state.store(), &config))
        })
        .collect();
    drop(state);

    let errors = upload_errors.read().clone();
    let preview_style = format!(
        "position: relative; width: {}px; height: {}px; background-color: {};",
        PREVIEW.width, PREVIEW.height, color
    );
    let cursor_style = if dragging { "grabbing" } else { "default" };

    rsx! {
        document::Stylesheet { href: MAIN_CSS }
        div {
            class: "studio-container",
            style: "cursor: {cursor_style};",

            div {
                class: "left-panel",
                h2 { "Design Studio" }

                div {
                    class: "side-tabs",
                    for (side, thumb) in thumbnails {
                        div {
                            key: "{side}",
                            class: if side == active { "side-tab selected" } else { "side-tab" },
                            onclick: move |_| session.write().set_active_side(side),
                            {thumb}
                            span { "{side_title(side)}" }
                        }
                    }
                }

                for side in Side::ALL {
                    div {
                        key: "upload-{side}",
                        class: "control-group",
                        label { "{side_title(side)} artwork" }
                        input {
                            r#type: "file",
                            accept: "image/*",
                            onchange: move |evt| upload(side, evt),
                        }
                        if let Some(error) = errors.get(side) {
                            div { class: "upload-error", "{error}" }
                        }
                        if session.read().image(side).is_some() {
                            button {
                                class: "action-btn danger",
                                onclick: move |_| {
                                    session.write().clear_image(side);
                                    *upload_errors.write().get_mut(side) = None;
                                },
                                "Remove"
                            }
                        }
                    }
                }

                div {
                    class: "inspector-panel",
                    h3 { "{side_title(active)} placement" }

                    div {
                        class: "control-group",
                        label { "Size: {transform.size}%" }
                        input {
                            r#type: "range",
                            min: "{SIZE_SLIDER.0}",
                            max: "{SIZE_SLIDER.1}",
                            value: "{transform.size}",
                            disabled: !has_active_image,
                            oninput: move |evt| {
                                if let Some(size) = parse_slider(&evt.value()) {
                                    session.write().set_size(size);
                                }
                            }
                        }
                    }
                    div {
                        class: "control-group",
                        label { "Rotation: {transform.rotation}°" }
                        input {
                            r#type: "range",
                            min: "{ROTATION_SLIDER.0}",
                            max: "{ROTATION_SLIDER.1}",
                            value: "{transform.rotation}",
                            disabled: !has_active_image,
                            oninput: move |evt| {
                                if let Some(degrees) = parse_slider(&evt.value()) {
                                    session.write().set_rotation(degrees);
                                }
                            }
                        }
                    }
                    div {
                        class: "control-group row",
                        button {
                            class: if transform.flipped { "action-btn active" } else { "action-btn" },
                            disabled: !has_active_image,
                            onclick: move |_| {
                                session.write().toggle_flip();
                            },
                            "Flip"
                        }
                        button {
                            class: "action-btn",
                            disabled: !has_active_image,
                            onclick: move |_| session.write().reset_side(active),
                            "Reset"
                        }
                    }
                }
            }

            div {
                class: "canvas-area",
                div {
                    class: "garment-preview",
                    style: "{preview_style}",
                    onpointermove: move |evt| {
                        if session.read().is_dragging() {
                            let coords = evt.page_coordinates();
                            session.write().drag_to(PointerPos::new(coords.x, coords.y));
                        }
                    },
                    onpointerup: move |_| session.write().end_drag(),
                    onpointerleave: move |_| session.write().end_drag(),

                    match preview_layer {
                        Some(SideLayer::Artwork { src, style }) => rsx! {
                            img {
                                class: "drape-artwork draggable",
                                src: "{src}",
                                style: "{style}",
                                draggable: "false",
                                onpointerdown: move |evt| {
                                    evt.prevent_default();
                                    let coords = evt.page_coordinates();
                                    session.write().begin_drag(PREVIEW, PointerPos::new(coords.x, coords.y));
                                },
                            }
                        },
                        Some(SideLayer::Placeholder { style }) => rsx! {
                            div { class: "drape-placeholder", style: "{style}", "?" }
                        },
                        None => rsx! {
                            div { class: "empty-state", "Upload artwork for the {side_title(active).to_lowercase()}" }
                        },
                    }
                }
                div {
                    class: "safe-zone-hint",
                    "Drag the design to position it inside the print area"
                }
            }

            div {
                class: "right-panel",

                div {
                    class: "control-group",
                    label { "Garment size" }
                    div {
                        class: "size-options",
                        for size in config.garment_sizes.iter().cloned() {
                            button {
                                key: "{size}",
                                class: if garment_size.as_deref() == Some(size.as_str()) { "size-btn selected" } else { "size-btn" },
                                onclick: {
                                    let size = size.clone();
                                    move |_| session.write().select_garment_size(size.clone())
                                },
                                "{size}"
                            }
                        }
                    }
                }

                div {
                    class: "control-group",
                    label { "Color" }
                    div {
                        class: "color-options",
                        for swatch in config.garment_colors.iter().cloned() {
                            button {
                                key: "{swatch}",
                                class: if swatch == color { "swatch selected" } else { "swatch" },
                                style: "background-color: {swatch};",
                                title: "{swatch}",
                                onclick: {
                                    let swatch = swatch.clone();
                                    move |_| session.write().select_color(swatch.clone())
                                },
                            }
                        }
                    }
                }

                div {
                    class: "header-actions",
                    button {
                        class: "primary-btn",
                        disabled: !can_add,
                        onclick: move |_| {
                            let item = session.read().add_to_cart(PRODUCT_ID, 1);
                            match item {
                                Ok(item) => {
                                    last_json.set(item.to_json().ok());
                                    cart.write().push(item);
                                    cart_notice.set(None);
                                }
                                Err(e) => cart_notice.set(Some(e.to_string())),
                            }
                        },
                        "Add to cart"
                    }
                    button {
                        class: "action-btn",
                        onclick: move |_| {
                            session.write().start_new_design();
                            upload_errors.set(PerSide::default());
                            cart_notice.set(None);
                        },
                        "Start new design"
                    }
                }
                if let Some(notice) = cart_notice.read().as_ref() {
                    div { class: "upload-error", "{notice}" }
                }

                CartPanel {
                    items: cart,
                    config: config.clone(),
                    on_remove: move |idx: usize| {
                        if idx < cart.read().len() {
                            cart.write().remove(idx);
                        }
                    },
                }

                if let Some(json) = last_json.read().clone() {
                    div {
                        class: "json-pane",
                        div {
                            class: "header-actions",
                            h3 { "Last line item" }
                            button {
                                class: "action-btn",
                                onclick: {
                                    let json = json.clone();
                                    move |_| {
                                        let json = json.clone();
                                        async move {
                                            let script = format!("navigator.clipboard.writeText({})", serde_json::Value::String(json));
                                            let mut eval = document::eval(&script);
                                            let _: Result<serde_json::Value, _> = eval.recv().await;
                                        }
                                    }
                                },
                                "Copy JSON"
                            }
                        }
                        pre { "{json}" }
                    }
                }
            }
        }
    }
}

#[component]
pub fn CartPanel(items: Signal<Vec<CartLineItem>>, config: EngineConfig, on_remove: EventHandler<usize>) -> Element {
    let items = items.read();

    rsx! {
        div {
            class: "cart-panel",
            h3 { "Cart ({items.len()})" }
            if items.is_empty() {
                div { class: "empty-state", "Your cart is empty" }
            }
            for (idx, item) in items.iter().enumerate() {
                div {
                    key: "{idx}",
                    class: "cart-row",
                    {render_line_item_to_rsx(item, THUMBNAIL, &config)}
                    button {
                        class: "icon-btn",
                        title: "Remove",
                        onclick: move |_| on_remove.call(idx),
                        "✕"
                    }
                }
            }
        }
    }
}
