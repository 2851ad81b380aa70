pub fn get_route_file() -> String {
    std::env::var("ROUTE_FILE").unwrap_or_else(|_| {
        let default = "route.yaml".to_string();
        tracing::trace!("ROUTE_FILE not set, using default: {default}");
        default
    })
}
