use adapter::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}
