use crate::cli::ValidateArgs;
use crate::packages::load_packages;
use crate::style;

use super::CommandContext;

pub fn cmd_validate(args: ValidateArgs) -> i32 {
    let ctx = match CommandContext::new(&args.root) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let packages = match load_packages(&ctx.root, &ctx.config) {
        Ok(packages) => packages,
        Err(e) => {
            style::error(&e.to_string());
            return 1;
        }
    };

    let issues = packages.validate();
    if issues.is_empty() {
        style::success(&format!("{} packages are valid", packages.len()));
        return 0;
    }

    style::section("Package validation failed");
    for issue in &issues {
        style::issue(issue);
    }
    1
}
