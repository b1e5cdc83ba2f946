/// Everything that reaches the UI from outside the widget tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Next,
    Prev,
    Open(usize),
    Close,
    ConfigReload,
    ManifestChanged,
}
