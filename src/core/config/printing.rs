use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.store_path {
            Some(path) => println!("  store-path: {}", path_display(path)),
            None => match self.resolve_store_path() {
                Ok(path) => println!("  store-path: (default: {})", path_display(path)),
                Err(_) => println!("  store-path: (unset)"),
            },
        }
        match &self.log_filter {
            Some(filter) => println!("  log-filter: {filter}"),
            None => println!("  log-filter: (default: warn)"),
        }
    }
}
