use chrono::{Datelike, Utc};

use crate::notifications::{PaymentPendingEmail, WelcomeEmail};

pub const WELCOME_SUBJECT: &str = "🎉 Bem-vindo à Vibe Coding!";
pub const PAYMENT_PENDING_SUBJECT: &str = "📋 Dados para Pagamento - Vibe Coding";

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Formats minor units the way Angolan receipts print kwanza: `15.000 Kz`, `1.234,50 Kz`.
pub fn format_kwanza(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    let (whole, cents) = (abs / 100, abs % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if cents == 0 {
        format!("{sign}{grouped} Kz")
    } else {
        format!("{sign}{grouped},{cents:02} Kz")
    }
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family: Arial, sans-serif; background-color: #f4f4f4; margin: 0; padding: 20px;">
  <div style="max-width: 600px; margin: 0 auto; background: white; border-radius: 12px; overflow: hidden;">
    <div style="background: linear-gradient(135deg, #0ea5e9, #6366f1); padding: 30px; text-align: center;">
      <h1 style="color: white; margin: 0; font-size: 24px;">🎓 Vibe Coding</h1>
    </div>
    <div style="padding: 30px;">
{body}
    </div>
    <div style="background: #f8fafc; padding: 20px; text-align: center; color: #64748b; font-size: 12px;">
      <p>© {year} Vibe Coding. Todos os direitos reservados.</p>
    </div>
  </div>
</body>
</html>"#,
        year = Utc::now().year(),
    )
}

pub fn welcome_html(email: &WelcomeEmail) -> String {
    let body = format!(
        r#"      <h2>Olá {name}! 👋</h2>
      <p>O seu pagamento foi confirmado. Já pode aceder à plataforma com os dados abaixo.</p>
      <p><strong>Email:</strong> {to}<br><strong>Senha:</strong> {password}</p>
      <p>Recomendamos que altere a senha depois do primeiro acesso.</p>
      <a href="{dashboard_url}" style="background: #0ea5e9; color: white; padding: 15px 30px; border-radius: 8px; text-decoration: none; display: inline-block;">Aceder ao painel</a>"#,
        name = escape_html(&email.name),
        to = escape_html(&email.to),
        password = escape_html(&email.password),
        dashboard_url = escape_html(&email.dashboard_url),
    );
    layout(&body)
}

pub fn payment_pending_html(email: &PaymentPendingEmail) -> String {
    let body = format!(
        r#"      <h2>Olá {name}! 👋</h2>
      <p>O seu pagamento está <strong>pendente</strong>. Conclua o pagamento para aceder à Vibe Coding e começar o seu curso!</p>
      <div style="background: #f8fafc; border: 2px solid #e2e8f0; border-radius: 12px; padding: 20px; margin: 20px 0;">
        <p><span style="color: #64748b;">Entidade:</span> <strong>{entity}</strong></p>
        <p><span style="color: #64748b;">Referência:</span> <strong>{reference}</strong></p>
        <p><span style="color: #64748b;">Valor:</span> <strong>{amount}</strong></p>
      </div>
      <div style="background: #fef3c7; border-left: 4px solid #f59e0b; padding: 15px; margin: 20px 0;">
        <strong>📱 Como pagar:</strong>
        <ul>
          <li>Use qualquer <strong>ATM</strong> (caixa automática)</li>
          <li>Use o app <strong>Multicaixa Express</strong> → Pagamentos por Referência</li>
          <li>Use o seu <strong>Internet Banking</strong></li>
        </ul>
      </div>
      <p style="color: #64748b; font-size: 14px;">Assim que confirmarmos o pagamento, receberá automaticamente os seus dados de acesso por email.</p>"#,
        name = escape_html(&email.name),
        entity = escape_html(&email.entity),
        reference = escape_html(&email.reference_number),
        amount = format_kwanza(email.amount_minor),
    );
    layout(&body)
}
