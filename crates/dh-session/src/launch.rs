/// Connector used to start a debuggee in a fresh local VM.
pub const COMMAND_LINE_LAUNCH: &str = "com.sun.jdi.CommandLineLaunch";

/// How to start a local debuggee under the debugger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub debuggee_class: String,
    /// VM options for the debuggee, passed through the connector.
    pub debuggee_options: Option<String>,
}

impl LaunchOptions {
    pub fn new(debuggee_class: impl Into<String>) -> Self {
        Self {
            debuggee_class: debuggee_class.into(),
            debuggee_options: None,
        }
    }

    pub fn debuggee_options(mut self, options: impl Into<String>) -> Self {
        self.debuggee_options = Some(options.into());
        self
    }

    /// `com.sun.jdi.CommandLineLaunch:[options=<opts>,]main=<class>`
    pub fn connector_spec(&self) -> String {
        let mut connector = format!("{COMMAND_LINE_LAUNCH}:");
        if let Some(options) = &self.debuggee_options {
            connector.push_str("options=");
            connector.push_str(options);
            connector.push(',');
        }
        connector.push_str("main=");
        connector.push_str(&self.debuggee_class);
        connector
    }

    /// Debugger arguments for a local launch.
    pub fn connector_args(&self) -> Vec<String> {
        vec!["-connect".to_string(), self.connector_spec()]
    }
}
