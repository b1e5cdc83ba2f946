use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;

pub struct ThemeColors {
    pub backdrop: Srgba<f64>,
    pub card: Srgba<f64>,
    pub central: Srgba<f64>,
    pub indicator: Srgba<f64>,
    pub text: Srgba<f64>,
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        Self {
            backdrop: Self::lookup_color(
                context,
                "theme_bg_color",
                Srgba::new(0.04, 0.04, 0.05, 0.92),
                Some(0.92),
            ),
            card: Self::lookup_color(
                context,
                "theme_base_color",
                Srgba::new(0.18, 0.18, 0.2, 1.0),
                Some(1.0),
            ),
            central: Self::lookup_color(
                context,
                "theme_selected_bg_color",
                Srgba::new(0.4, 0.4, 0.8, 0.9),
                Some(0.9),
            ),
            indicator: Self::lookup_color(
                context,
                "theme_fg_color",
                Srgba::new(0.9, 0.9, 0.9, 0.8),
                Some(0.8),
            ),
            text: Self::lookup_color(
                context,
                "theme_fg_color",
                Srgba::new(1.0, 1.0, 1.0, 1.0),
                None,
            ),
        }
    }

    fn lookup_color(
        context: &gtk::StyleContext,
        name: &str,
        fallback: Srgba<f64>,
        alpha_override: Option<f64>,
    ) -> Srgba<f64> {
        context
            .lookup_color(name)
            .map(|c| {
                Srgba::new(
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    alpha_override.unwrap_or(c.alpha() as f64),
                )
            })
            .unwrap_or(fallback)
    }
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    provider.load_from_data(
        "
.rondo-window, .rondo-stage {
    background: none;
    background-color: transparent;
}
",
    );

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
