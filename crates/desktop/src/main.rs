mod app;
mod display;
mod theme;

mod tabs {
    pub mod about_tab;
    pub mod image_tab;
    pub mod settings_tab;
    pub mod video_tab;
}

mod workers {
    pub mod model_cache;
}

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("FaceFinder")
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(680.0, 820.0),
            ..Default::default()
        })
        .run()
}
