fn main() {
    // Only the firmware binary needs the ESP-IDF build environment; host
    // test builds run with `--no-default-features`.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
