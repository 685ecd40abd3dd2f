use anyhow::Result;

use crate::api::ApiClient;

pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<()> {
    let user = client.login(username, password).await?;
    println!(
        "Logged in as {} ({} plan, {} credits)",
        user.username, user.plan, user.credits
    );
    Ok(())
}

pub async fn signup(client: &ApiClient, username: &str, password: &str, plan: &str) -> Result<()> {
    let user = client.signup(username, password, plan).await?;
    println!(
        "Account created for {} ({} plan). Run `v2v login` to sign in.",
        user.username, user.plan
    );
    Ok(())
}

pub async fn me(client: &ApiClient) -> Result<()> {
    let user = client.me().await?;
    println!("{}", user.username);
    println!("  plan:    {}", user.plan);
    println!("  credits: {}", user.credits);
    if let Some(last_login) = &user.last_login {
        println!("  last login: {}", last_login);
    }
    Ok(())
}

pub fn logout(client: &ApiClient) -> Result<()> {
    client.logout()?;
    println!("Logged out");
    Ok(())
}
