fn main() {
    std::process::exit(modsync::run());
}
