mod mailbox_tests;
mod presence_tests;
mod relay_tests;
mod room_tests;
mod utils;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
