fn main() {
    if let Err(err) = flight_delays::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
