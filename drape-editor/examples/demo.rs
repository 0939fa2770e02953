use dioxus::prelude::*;
use drape_editor::DesignStudio;

fn main() {
    dioxus::launch(App);
}

fn App() -> Element {
    rsx! {
        style {
            "{{
                body, html {{
                    margin: 0;
                    padding: 0;
                    height: 100%;
                    width: 100%;
                }}
            }}"
        }
        DesignStudio {}
    }
}
