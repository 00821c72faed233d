fn main() {
    reactive::app::startup::startup();
}
