/// Colorized panic reports with backtraces. Only enabled when debugging.
pub fn setup() {
    #[cfg(debug_assertions)]
    {
        color_backtrace::install();
    }
}
