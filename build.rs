fn main() {
    // Host builds (tests, simulation) have nothing to link against.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
