use drape_core::{DesignSession, FileDescriptor, Side};
use drape_render::{Renderer, Surface};
use image::{Rgba, RgbaImage};
use std::fs::File;
use std::io::Write;

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let mut art = RgbaImage::new(120, 80);
    for x in 0..120 {
        for y in 0..80 {
            let color = if (x / 10 + y / 10) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            };
            art.put_pixel(x, y, color);
        }
    }
    let mut art_bytes = Vec::new();
    art.write_to(&mut std::io::Cursor::new(&mut art_bytes), image::ImageFormat::Png).unwrap();
    tracing::info!(bytes = art_bytes.len(), "artwork created");

    let mut session = DesignSession::default();
    session.select_garment_size("M");
    session.select_color("#1e3a8a");

    let file = FileDescriptor::new("checker.png", "image/png", art_bytes.len() as u64);
    let ticket = session.begin_upload(Side::Front, &file).expect("upload rejected");
    session.finish_upload(ticket.decode(&art_bytes)).expect("decode failed");
    session.set_rotation(30);
    session.set_size(70);
    session.toggle_flip();

    let item = session.add_to_cart("tee-classic", 1).expect("cart refused");
    let payload = item.customization.as_ref().expect("no customization");
    println!("{}", item.to_json().unwrap());

    let surface = Surface::new(320, 380, item.color.clone());
    let mut renderer = Renderer::with_config(session.config().clone());

    let start = std::time::Instant::now();
    let iterations = 50;
    for _ in 0..iterations {
        renderer.render_payload(payload, Side::Front, &surface).expect("Failed to render");
    }
    tracing::info!(average = ?(start.elapsed() / iterations), "render loop finished");

    for side in Side::ALL {
        let png = renderer.render_payload(payload, side, &surface).expect("Failed to render");
        let path = format!("design_{side}.png");
        File::create(&path).unwrap().write_all(&png).unwrap();
        println!("Saved to {path}");
    }
}
