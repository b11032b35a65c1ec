fn main() {
    // ESP-IDF link arguments are only needed for flash builds; host builds
    // (tests, simulation) compile without the `espidf` feature.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
