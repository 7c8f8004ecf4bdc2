fn main() {
    println!("cargo:rerun-if-changed=sdkconfig.defaults");

    // Only device builds need the ESP-IDF environment; host tests skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
