use dh_session::LaunchOptions;

/// Print one connector argument per line.
pub fn run(main_class: &str, options: Option<&str>) {
    let mut launch = LaunchOptions::new(main_class);
    if let Some(options) = options {
        launch = launch.debuggee_options(options);
    }
    for arg in launch.connector_args() {
        println!("{arg}");
    }
}
