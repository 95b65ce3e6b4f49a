#![forbid(unsafe_code)]

fn main() {
    rush::shell_main()
}
