use mylogs::auth;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

fn print_usage_and_exit() -> ! {
    eprintln!("Usage: mylogs-verify <password> [base-url]");
    std::process::exit(1);
}

fn main() {
    let mut args = std::env::args().skip(1); // 跳过程序名

    let password = args.next().unwrap_or_else(|| {
        eprintln!("Missing <password>");
        print_usage_and_exit();
    });

    let base_url = args.next().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    if args.next().is_some() {
        eprintln!("Too many arguments provided.");
        print_usage_and_exit();
    }

    // 与管理后台相同：先用 now - 1 验证，成功后输出 now 对应的令牌
    let (token, session) = auth::bootstrap(&password, auth::unix_now());

    let client = reqwest::blocking::Client::new();
    let res = client
        .post(format!("{}/api/admin/verify", base_url.trim_end_matches('/')))
        .json(&serde_json::json!({ "token": token }))
        .send();

    match res {
        Ok(resp) => {
            let status = resp.status();
            if !status.is_success() {
                eprintln!("❌ Authenticate Failure");
                eprintln!("{}", status);
                std::process::exit(1);
            } else {
                println!("✅ Authenticated");
                println!("{}", session);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to contact verify API: {}", e);
            std::process::exit(1);
        }
    }
}
