//! Application services: notifications, page reloads, rule updates and the
//! edit lock.

pub mod error;
pub mod form;
pub mod lock;
pub mod page;
pub mod reply;
pub mod submit;
pub mod toast;

use crate::infra::http::ConsoleClient;

use self::{
    form::FormController, lock::LockService, page::Page, submit::SubmitClient, toast::ToastStack,
};

/// Every service of one console session, built once at start-up and handed
/// to whatever needs it.
#[derive(Clone)]
pub struct Console {
    pub toasts: ToastStack,
    pub page: Page,
    pub forms: FormController,
    pub submit: SubmitClient,
    pub locks: LockService,
}

impl Console {
    pub fn new(client: ConsoleClient) -> Self {
        let toasts = ToastStack::new();
        let page = Page::new();
        let submit = SubmitClient::new(client.clone(), toasts.clone(), page.clone());
        let forms = FormController::new(submit.clone(), toasts.clone());
        let locks = LockService::new(client, toasts.clone(), page.clone());

        Self {
            toasts,
            page,
            forms,
            submit,
            locks,
        }
    }
}
