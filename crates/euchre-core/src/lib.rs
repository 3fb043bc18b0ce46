pub mod game;
pub mod model;
pub mod rules;
pub mod world;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "mdeuchre"
    }

    pub const fn codename() -> &'static str {
        "Monte Carlo Table"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "mdeuchre");
        assert_eq!(AppInfo::codename(), "Monte Carlo Table");
        assert!(!AppInfo::version().is_empty());
    }
}
