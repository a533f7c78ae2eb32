use meridian::logger::init_logging;
use meridian::uci::uci_loop;

fn main() {
    init_logging("warn");
    uci_loop();
}
