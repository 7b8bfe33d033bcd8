//! Plain-text rendering for each command.

use chrono::Duration;

use social_core::models::{Post, User};
use social_core::{Route, Session};

pub fn login_prompt(route: Route, last_email: Option<&str>) {
    if let Some(notice) = route.notice() {
        println!("{}", notice);
    }
    match last_email {
        Some(email) => println!("Log in with: social login {}", email),
        None => println!("Log in with: social login <email>"),
    }
}

pub fn status(session: &Session, remaining: Duration) {
    let name = session
        .user
        .as_ref()
        .map(|u| format!("{} <{}>", u.username, u.email))
        .unwrap_or_else(|| "unknown user".to_string());
    println!(
        "Logged in as {} ({}; token valid for another {}h {:02}m)",
        name,
        session.status,
        remaining.num_hours(),
        remaining.num_minutes() % 60
    );
}

pub fn feed(posts: &[Post]) {
    if posts.is_empty() {
        println!("No posts yet.");
        return;
    }
    for post in posts {
        let date = post
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("[{}] {}  {}", post.author.initial(), post.author.username, date);
        println!("    {}", post.content);
        println!("    likes: {}  comments: {}", post.likes, post.comments);
        println!();
    }
}

pub fn profile(user: &User) {
    println!("[{}] {}", user.initial(), user.username);
    println!("    {}", user.email);
    if let Some(joined) = user.created_at {
        println!("    Joined {}", joined.format("%Y-%m-%d"));
    }
    println!();
    match user.bio.as_deref().filter(|b| !b.trim().is_empty()) {
        Some(bio) => println!("{}", bio),
        None => println!("No bio yet."),
    }
}
