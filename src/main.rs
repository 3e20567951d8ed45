use routebench::error::AppResult;

fn main() -> AppResult<()> {
    routebench::entry::run()
}
