//! [`ContentFetcher`] over the reqwest backed fetcher of `tessera-net`.

use tessera_net::{HttpContentFetcher, RequestId};

use super::content::{ContentFetcher, FetchCompletion, FetchRequest, FetchResponse, FetchTicket};

impl ContentFetcher for HttpContentFetcher {
    fn fetch(&mut self, request: FetchRequest) -> FetchTicket {
        FetchTicket::new(self.get(&request.url, &request.headers).as_u64())
    }

    fn cancel(&mut self, ticket: FetchTicket) {
        HttpContentFetcher::cancel(self, RequestId::from_raw(ticket.as_u64()));
    }

    fn poll(&mut self) -> Vec<FetchCompletion> {
        self.drain()
            .into_iter()
            .map(|completion| FetchCompletion {
                ticket: FetchTicket::new(completion.id.as_u64()),
                result: completion
                    .result
                    .map(|response| FetchResponse {
                        status: response.status,
                        body: response.body,
                    })
                    .map_err(|error| error.to_string()),
            })
            .collect()
    }
}
