fn main() {
    estate::cli::run();
}
